use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod instructions;
pub mod introspection;

pub use constants::*;
pub use error::*;
pub use instructions::*;
pub use introspection::*;

declare_id!("7ezWqTzm5TrQCJMd7Je2RhSB6jdD964KyYrCee4Q2Sf");

#[program]
pub mod flash_pool {
    use super::*;

    pub fn withdraw(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
        instructions::withdraw::handler(ctx, amount)
    }

    pub fn repay(ctx: Context<Repay>, amount: u64) -> Result<()> {
        instructions::repay::handler(ctx, amount)
    }
}
