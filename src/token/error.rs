//! Ledger rejection reasons

use crate::token::Amount;
use thiserror::Error;

/// Reasons a ledger operation is rejected
///
/// Every variant aborts the whole operation; no state is changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Caller is the zero address")]
    ZeroCaller,
    #[error("Recipient is the zero address")]
    ZeroRecipient,
    #[error("Spender is the zero address")]
    ZeroSpender,
    #[error("Sender is the zero address")]
    ZeroSender,
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: Amount, need: Amount },
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}
