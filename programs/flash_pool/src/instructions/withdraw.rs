use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar;
use anchor_lang::system_program::{self, Transfer};

use crate::{
    constants::POOL_AUTHORITY_SEED,
    error::ErrorCode,
    introspection::{assert_top_level, verify_obligations, SysvarInstructions},
};

pub fn handler(ctx: Context<Withdraw>, amount: u64) -> Result<()> {
    let ixs = ctx.accounts.instructions.to_account_info();
    assert_top_level(&ixs, ctx.program_id)?;

    // The list is fixed before execution starts, so the withdraw-time scan
    // already proves the matching repay exists further down.
    verify_obligations(
        &SysvarInstructions::new(&ixs),
        ctx.program_id,
        &ctx.accounts.pool_authority.key(),
    )?;

    require!(
        ctx.accounts.pool_authority.lamports() >= amount,
        ErrorCode::InsufficientPoolFunds
    );

    let pool_authority_bump = ctx.bumps.pool_authority;
    let seed_group: &[&[u8]] = &[POOL_AUTHORITY_SEED, &[pool_authority_bump]];
    let signer_seeds = &[seed_group];
    system_program::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.system_program.to_account_info(),
            Transfer {
                from: ctx.accounts.pool_authority.to_account_info(),
                to: ctx.accounts.borrower.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
    )?;

    Ok(())
}

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(mut)]
    pub borrower: Signer<'info>,
    #[account(mut, seeds = [POOL_AUTHORITY_SEED], bump)]
    pub pool_authority: SystemAccount<'info>,
    /// CHECK: instructions sysvar, address-constrained.
    #[account(address = sysvar::instructions::ID @ ErrorCode::AddressMismatch)]
    pub instructions: UncheckedAccount<'info>,
    pub system_program: Program<'info, System>,
}
