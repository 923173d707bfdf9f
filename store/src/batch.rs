//! Atomic write batches.
//!
//! A batch groups every read and write of one ledger mutation into a
//! single backend transaction: a transfer's funds check, debit, credit,
//! and paired ledger rows all live in one batch and commit together.
//! Dropping a batch without committing rolls everything back.
//!
//! Batches also serialize writers — the backend hands out one at a time,
//! bounded by its configured wait. That is what makes two concurrent
//! transfers out of the same wallet linearize instead of both observing
//! the same starting balance.

use crate::transaction::{TransactionRecord, TransactionStore};
use crate::user::{UserRecord, UserStore};
use crate::wallet::{CurrencyHolding, WalletRecord, WalletStore};
use crate::StoreError;
use custodia_types::{TransactionId, TransferId, UserId, WalletId};

/// A storage backend the ledger core can run on.
pub trait LedgerStore: UserStore + WalletStore + TransactionStore {
    type Batch<'a>: WriteBatch
    where
        Self: 'a;

    /// Begin an exclusive write batch. Fails with [`StoreError::Busy`]
    /// when another writer holds the slot past the backend's wait bound.
    fn begin_write(&self) -> Result<Self::Batch<'_>, StoreError>;
}

/// One atomic unit of ledger mutation.
///
/// Reads performed through the batch observe prior writes in the same
/// batch and are isolated from concurrent committers.
pub trait WriteBatch {
    // ── Reads inside the batch ──────────────────────────────────────────

    fn get_user(&self, user_id: UserId) -> Result<UserRecord, StoreError>;
    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError>;
    fn get_wallet(&self, wallet_id: WalletId) -> Result<WalletRecord, StoreError>;
    fn get_holding(&self, wallet_id: WalletId) -> Result<CurrencyHolding, StoreError>;
    fn wallets_for_user(&self, user_id: UserId) -> Result<Vec<WalletRecord>, StoreError>;
    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError>;

    // ── Writes ──────────────────────────────────────────────────────────

    fn put_user(&mut self, record: &UserRecord) -> Result<(), StoreError>;
    fn put_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError>;
    fn put_holding(&mut self, holding: &CurrencyHolding) -> Result<(), StoreError>;

    /// Append a ledger row. The row and its per-user index entry become
    /// visible only when the batch commits.
    fn put_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError>;

    // ── Id sequences ────────────────────────────────────────────────────

    fn next_wallet_id(&mut self) -> Result<WalletId, StoreError>;
    fn next_transaction_id(&mut self) -> Result<TransactionId, StoreError>;
    fn next_transfer_id(&mut self) -> Result<TransferId, StoreError>;

    // ── Commit ──────────────────────────────────────────────────────────

    /// Commit every batched operation. Consumes the batch; a batch that
    /// is dropped instead is rolled back.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}
