//! LMDB implementation of TransactionStore.

use custodia_store::transaction::{TransactionRecord, TransactionStore};
use custodia_store::StoreError;
use custodia_types::{TransactionId, UserId};

use crate::environment::LmdbEnvironment;
use crate::keys::{transaction_key, user_prefix_bounds};
use crate::LmdbError;

impl LmdbEnvironment {
    /// Walk the `user_txs` index (already newest-first), skipping `offset`
    /// entries and resolving up to `limit` rows. `limit == usize::MAX`
    /// means "all of them".
    fn scan_user_txs(
        &self,
        user_id: UserId,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let (lower, upper) = user_prefix_bounds(user_id);
        let bounds = (
            lower.as_ref().map(|b| b.as_slice()),
            upper.as_ref().map(|b| b.as_slice()),
        );
        let iter = self
            .user_txs_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;

        let mut rows = Vec::new();
        for result in iter.skip(offset as usize) {
            if rows.len() >= limit {
                break;
            }
            let (_key, tx_id_bytes) = result.map_err(LmdbError::from)?;
            let val = self
                .transactions_db
                .get(&rtxn, tx_id_bytes)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption("user_txs index points at missing transaction".into())
                })?;
            let record: TransactionRecord =
                bincode::deserialize(val).map_err(LmdbError::from)?;
            rows.push(record);
        }
        Ok(rows)
    }
}

impl TransactionStore for LmdbEnvironment {
    fn get_transaction(&self, id: TransactionId) -> Result<TransactionRecord, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .transactions_db
            .get(&rtxn, &transaction_key(id))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("transaction {id}")))?;
        let record: TransactionRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, StoreError> {
        self.scan_user_txs(user_id, 0, usize::MAX)
    }

    fn transactions_for_user_paged(
        &self,
        user_id: UserId,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        self.scan_user_txs(user_id, offset, limit)
    }

    fn transaction_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let count = self.transactions_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
