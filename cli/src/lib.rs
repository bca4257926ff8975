pub mod assemble;
pub mod context;
pub mod error;
pub mod router;
pub mod submit;

pub use error::FlashCliError;
