pub mod repay;
pub mod withdraw;

pub use repay::*;
pub use withdraw::*;
