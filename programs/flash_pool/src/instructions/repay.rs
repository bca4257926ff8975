use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar;
use anchor_lang::system_program::{self, Transfer};

use crate::{
    constants::POOL_AUTHORITY_SEED,
    error::ErrorCode,
    introspection::{assert_top_level, verify_obligations, SysvarInstructions},
};

pub fn handler(ctx: Context<Repay>, amount: u64) -> Result<()> {
    let ixs = ctx.accounts.instructions.to_account_info();
    assert_top_level(&ixs, ctx.program_id)?;

    require!(
        ctx.accounts.borrower.lamports() >= amount,
        ErrorCode::InsufficientRepaymentFunds
    );

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.borrower.to_account_info(),
                to: ctx.accounts.pool_authority.to_account_info(),
            },
        ),
        amount,
    )?;

    // Redundant with the withdraw-time check; the transaction must still be
    // structurally settled when the final handler runs.
    verify_obligations(
        &SysvarInstructions::new(&ixs),
        ctx.program_id,
        &ctx.accounts.pool_authority.key(),
    )?;

    Ok(())
}

#[derive(Accounts)]
pub struct Repay<'info> {
    #[account(mut)]
    pub borrower: Signer<'info>,
    #[account(mut, seeds = [POOL_AUTHORITY_SEED], bump)]
    pub pool_authority: SystemAccount<'info>,
    /// CHECK: instructions sysvar, address-constrained.
    #[account(address = sysvar::instructions::ID @ ErrorCode::AddressMismatch)]
    pub instructions: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}
