use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::sysvar::instructions::{
    load_current_index_checked, load_instruction_at_checked,
};
use anchor_lang::Discriminator;

use crate::error::ErrorCode;

/// Read access to the ordered instruction list of the executing transaction.
/// The list is fixed before any instruction in it runs, so a full forward
/// scan at withdraw-time already sees every repay that will ever execute.
pub trait InstructionLoader {
    fn load(&self, index: usize) -> Option<Instruction>;
}

/// Loader backed by the instructions sysvar account.
pub struct SysvarInstructions<'a, 'info> {
    account: &'a AccountInfo<'info>,
}

impl<'a, 'info> SysvarInstructions<'a, 'info> {
    pub fn new(account: &'a AccountInfo<'info>) -> Self {
        Self { account }
    }
}

impl InstructionLoader for SysvarInstructions<'_, '_> {
    fn load(&self, index: usize) -> Option<Instruction> {
        load_instruction_at_checked(index, self.account).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObligationState {
    /// Every withdraw seen so far has been matched by a repay.
    Settled,
    /// At least one withdraw is still unmatched.
    Exposed,
}

/// A withdraw or repay entry pulled out of the instruction list.
#[derive(Debug, Clone, Copy)]
struct ObligationEntry {
    borrower: Pubkey,
    amount: u64,
}

impl ObligationEntry {
    /// Accounts follow the handler layout: borrower, pool authority,
    /// instructions sysvar, system program. Data is the 8-byte Anchor
    /// discriminator followed by the borsh-encoded u64 amount.
    fn try_from_instruction(ix: &Instruction, pool_authority: &Pubkey) -> Result<Self> {
        require!(ix.accounts.len() >= 2, ErrorCode::UnknownInstruction);
        require_keys_eq!(
            ix.accounts[1].pubkey,
            *pool_authority,
            ErrorCode::IncorrectPoolAuthority
        );
        let amount_bytes: [u8; 8] = ix
            .data
            .get(8..16)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| error!(ErrorCode::UnknownInstruction))?;
        Ok(Self {
            borrower: ix.accounts[0].pubkey,
            amount: u64::from_le_bytes(amount_bytes),
        })
    }
}

/// Transient per-transaction ledger of unmatched withdraws. Never persisted;
/// derived from scratch on every verification pass.
#[derive(Debug, Default)]
pub struct ObligationLedger {
    open: Vec<ObligationEntry>,
}

impl ObligationLedger {
    fn record_withdraw(&mut self, entry: ObligationEntry) {
        self.open.push(entry);
    }

    /// Settles the earliest open withdraw of the same borrower. A repay with
    /// no preceding withdraw at all is an ordering violation; one that only
    /// matches a different borrower is an identity violation.
    fn record_repay(&mut self, entry: ObligationEntry) -> Result<()> {
        require!(!self.open.is_empty(), ErrorCode::ObligationInvariantViolated);
        let position = self
            .open
            .iter()
            .position(|w| w.borrower == entry.borrower)
            .ok_or_else(|| error!(ErrorCode::RepayIdentityMismatch))?;
        let withdraw = self.open.remove(position);
        require!(
            entry.amount >= withdraw.amount,
            ErrorCode::InsufficientRepayment
        );
        Ok(())
    }

    pub fn state(&self) -> ObligationState {
        if self.open.is_empty() {
            ObligationState::Settled
        } else {
            ObligationState::Exposed
        }
    }
}

/// Rejects CPI invocation: the instruction at the current top-level index
/// must be this program's own.
pub fn assert_top_level(instructions: &AccountInfo, program_id: &Pubkey) -> Result<()> {
    let current_index = load_current_index_checked(instructions)? as usize;
    let current_ix = load_instruction_at_checked(current_index, instructions)?;
    require_keys_eq!(current_ix.program_id, *program_id, ErrorCode::ProgramMismatch);
    Ok(())
}

/// Scans the whole instruction list and proves the obligation invariant:
/// withdraw and repay counts are equal, every repay follows the withdraw it
/// settles, repays carry the matching borrower and pool authority, and each
/// repay amount covers its withdraw's principal. Any other instruction
/// targeting this program is rejected outright.
pub fn verify_obligations<L: InstructionLoader>(
    loader: &L,
    program_id: &Pubkey,
    pool_authority: &Pubkey,
) -> Result<()> {
    let mut ledger = ObligationLedger::default();
    let mut index = 0usize;
    while let Some(ix) = loader.load(index) {
        index += 1;
        if ix.program_id != *program_id {
            continue;
        }
        let discriminator = ix
            .data
            .get(..8)
            .ok_or_else(|| error!(ErrorCode::UnknownInstruction))?;
        if discriminator == crate::instruction::Withdraw::DISCRIMINATOR {
            ledger.record_withdraw(ObligationEntry::try_from_instruction(&ix, pool_authority)?);
        } else if discriminator == crate::instruction::Repay::DISCRIMINATOR {
            ledger.record_repay(ObligationEntry::try_from_instruction(&ix, pool_authority)?)?;
        } else {
            return err!(ErrorCode::UnknownInstruction);
        }
    }
    require!(
        ledger.state() == ObligationState::Settled,
        ErrorCode::ObligationInvariantViolated
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::solana_program::instruction::AccountMeta;
    use anchor_lang::solana_program::system_program;
    use anchor_lang::InstructionData;

    struct ListLoader(Vec<Instruction>);

    impl InstructionLoader for ListLoader {
        fn load(&self, index: usize) -> Option<Instruction> {
            self.0.get(index).cloned()
        }
    }

    fn pool_metas(borrower: Pubkey, pool_authority: Pubkey) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(borrower, true),
            AccountMeta::new(pool_authority, false),
            AccountMeta::new_readonly(
                anchor_lang::solana_program::sysvar::instructions::ID,
                false,
            ),
            AccountMeta::new_readonly(system_program::ID, false),
        ]
    }

    fn withdraw_ix(borrower: Pubkey, pool_authority: Pubkey, amount: u64) -> Instruction {
        Instruction {
            program_id: crate::ID,
            accounts: pool_metas(borrower, pool_authority),
            data: crate::instruction::Withdraw { amount }.data(),
        }
    }

    fn repay_ix(borrower: Pubkey, pool_authority: Pubkey, amount: u64) -> Instruction {
        Instruction {
            program_id: crate::ID,
            accounts: pool_metas(borrower, pool_authority),
            data: crate::instruction::Repay { amount }.data(),
        }
    }

    fn other_ix() -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![0; 4],
        }
    }

    fn assert_fails_with(result: Result<()>, expected: ErrorCode) {
        assert_eq!(result.unwrap_err(), expected.into());
    }

    #[test]
    fn withdraw_then_repay_settles() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            withdraw_ix(borrower, authority, 100),
            other_ix(),
            other_ix(),
            repay_ix(borrower, authority, 100),
        ]);
        assert!(verify_obligations(&loader, &crate::ID, &authority).is_ok());
    }

    #[test]
    fn withdraw_without_repay_fails() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            withdraw_ix(borrower, authority, 100),
            other_ix(),
            other_ix(),
        ]);
        assert_fails_with(
            verify_obligations(&loader, &crate::ID, &authority),
            ErrorCode::ObligationInvariantViolated,
        );
    }

    #[test]
    fn two_withdraws_one_repay_fails() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            withdraw_ix(borrower, authority, 100),
            withdraw_ix(borrower, authority, 100),
            other_ix(),
            other_ix(),
            repay_ix(borrower, authority, 100),
        ]);
        assert_fails_with(
            verify_obligations(&loader, &crate::ID, &authority),
            ErrorCode::ObligationInvariantViolated,
        );
    }

    #[test]
    fn repay_before_withdraw_fails() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            repay_ix(borrower, authority, 100),
            withdraw_ix(borrower, authority, 100),
        ]);
        assert_fails_with(
            verify_obligations(&loader, &crate::ID, &authority),
            ErrorCode::ObligationInvariantViolated,
        );
    }

    #[test]
    fn repay_below_principal_fails() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            withdraw_ix(borrower, authority, 100),
            repay_ix(borrower, authority, 99),
        ]);
        assert_fails_with(
            verify_obligations(&loader, &crate::ID, &authority),
            ErrorCode::InsufficientRepayment,
        );
    }

    #[test]
    fn repay_exactly_principal_settles() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            withdraw_ix(borrower, authority, 100),
            repay_ix(borrower, authority, 100),
        ]);
        assert!(verify_obligations(&loader, &crate::ID, &authority).is_ok());
    }

    #[test]
    fn repay_with_wrong_borrower_fails() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            withdraw_ix(borrower, authority, 100),
            repay_ix(Pubkey::new_unique(), authority, 100),
        ]);
        assert_fails_with(
            verify_obligations(&loader, &crate::ID, &authority),
            ErrorCode::RepayIdentityMismatch,
        );
    }

    #[test]
    fn repay_toward_wrong_authority_fails() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            withdraw_ix(borrower, authority, 100),
            repay_ix(borrower, Pubkey::new_unique(), 100),
        ]);
        assert_fails_with(
            verify_obligations(&loader, &crate::ID, &authority),
            ErrorCode::IncorrectPoolAuthority,
        );
    }

    #[test]
    fn unknown_program_instruction_fails() {
        let borrower = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let mut fake = other_ix();
        fake.program_id = crate::ID;
        fake.data = vec![9; 8];
        let loader = ListLoader(vec![
            withdraw_ix(borrower, authority, 100),
            fake,
            repay_ix(borrower, authority, 100),
        ]);
        assert_fails_with(
            verify_obligations(&loader, &crate::ID, &authority),
            ErrorCode::UnknownInstruction,
        );
    }

    #[test]
    fn independent_pairs_settle_per_borrower() {
        let first = Pubkey::new_unique();
        let second = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let loader = ListLoader(vec![
            withdraw_ix(first, authority, 100),
            withdraw_ix(second, authority, 250),
            other_ix(),
            repay_ix(second, authority, 250),
            repay_ix(first, authority, 100),
        ]);
        assert!(verify_obligations(&loader, &crate::ID, &authority).is_ok());
    }

    #[test]
    fn empty_list_is_settled() {
        let loader = ListLoader(vec![]);
        let authority = Pubkey::new_unique();
        assert!(verify_obligations(&loader, &crate::ID, &authority).is_ok());
    }

    #[test]
    fn ledger_state_transitions() {
        let borrower = Pubkey::new_unique();
        let mut ledger = ObligationLedger::default();
        assert_eq!(ledger.state(), ObligationState::Settled);
        ledger.record_withdraw(ObligationEntry {
            borrower,
            amount: 10,
        });
        assert_eq!(ledger.state(), ObligationState::Exposed);
        ledger
            .record_repay(ObligationEntry {
                borrower,
                amount: 10,
            })
            .unwrap();
        assert_eq!(ledger.state(), ObligationState::Settled);
    }
}
