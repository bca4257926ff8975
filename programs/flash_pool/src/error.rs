use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Instructions sysvar address mismatch")]
    AddressMismatch,
    #[msg("Handler must be invoked as a top-level instruction")]
    ProgramMismatch,
    #[msg("Withdraw/repay obligations are not settled within this transaction")]
    ObligationInvariantViolated,
    #[msg("Repay borrower does not match any open withdraw")]
    RepayIdentityMismatch,
    #[msg("Instruction does not target the pool authority")]
    IncorrectPoolAuthority,
    #[msg("Repay amount does not cover the withdrawn principal")]
    InsufficientRepayment,
    #[msg("Pool balance too low for requested withdraw")]
    InsufficientPoolFunds,
    #[msg("Borrower balance too low to repay")]
    InsufficientRepaymentFunds,
    #[msg("Unknown instruction targeting this program")]
    UnknownInstruction,
}
