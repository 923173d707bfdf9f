use custodia_store::StoreError;
use custodia_types::{Amount, UserId, WalletId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Amount),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("balance arithmetic overflow")]
    Overflow,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Only transient storage contention is worth retrying; the
    /// validation-class errors will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_retryable())
    }
}
