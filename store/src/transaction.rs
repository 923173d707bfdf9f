//! Transaction ledger storage trait.

use crate::StoreError;
use custodia_types::{
    Amount, CurrencyType, Timestamp, TransactionId, TransactionStatus, TransactionType,
    TransferId, UserId, WalletId,
};
use serde::{Deserialize, Serialize};

/// One row in the append-only transaction ledger.
///
/// Rows are never mutated once their status is final. The Send and
/// Receive halves of a transfer carry the same `transfer_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    /// Present on Send/Receive rows, absent on deposits.
    pub transfer_id: Option<TransferId>,
    /// The user this row belongs to (whose history it appears in).
    pub user_id: UserId,
    /// The wallet whose balance this row changed.
    pub wallet_id: WalletId,
    /// The other user of a transfer, if any.
    pub counterparty: Option<UserId>,
    pub currency_type: CurrencyType,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub timestamp: Timestamp,
}

/// Trait for transaction ledger reads.
///
/// Appends happen exclusively through [`crate::WriteBatch`] so that a row
/// only becomes visible together with the balance change it records.
pub trait TransactionStore {
    fn get_transaction(&self, id: TransactionId) -> Result<TransactionRecord, StoreError>;

    /// All rows owned by a user, most recent first (timestamp descending,
    /// transaction id descending as the tie-break).
    fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Paged variant of [`Self::transactions_for_user`]: up to `limit`
    /// rows starting `offset` rows into the same ordering.
    fn transactions_for_user_paged(
        &self,
        user_id: UserId,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError>;

    fn transaction_count(&self) -> Result<u64, StoreError>;
}
