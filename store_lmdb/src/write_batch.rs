//! Write batching — one ledger mutation per LMDB write transaction.
//!
//! A transfer's funds check, debit, credit, and paired ledger rows all go
//! through a single batch and commit with a single fsync. If the batch is
//! dropped without calling [`LmdbWriteBatch::commit`], the underlying
//! LMDB transaction is aborted and nothing becomes visible.

use std::sync::MutexGuard;

use heed::RwTxn;

use custodia_store::batch::WriteBatch;
use custodia_store::transaction::TransactionRecord;
use custodia_store::user::UserRecord;
use custodia_store::wallet::{CurrencyHolding, WalletRecord};
use custodia_store::StoreError;
use custodia_types::{TransactionId, TransferId, UserId, WalletId};

use crate::environment::LmdbEnvironment;
use crate::keys::{
    transaction_key, user_key, user_prefix_bounds, user_tx_key, user_wallet_key, wallet_key,
};
use crate::LmdbError;

const SEQ_WALLET: &[u8] = b"seq_wallet";
const SEQ_TRANSACTION: &[u8] = b"seq_transaction";
const SEQ_TRANSFER: &[u8] = b"seq_transfer";

/// An exclusive, atomic write batch over the LMDB environment.
pub struct LmdbWriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> LmdbWriteBatch<'a> {
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let guard = env.acquire_write()?;
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self {
            txn,
            env,
            _guard: guard,
        })
    }

    /// Bump a u64 sequence counter in `meta` and return the new value.
    /// Ids therefore start at 1.
    fn next_sequence(&mut self, key: &[u8]) -> Result<u64, StoreError> {
        let current = self
            .env
            .meta_db
            .get(&self.txn, key)
            .map_err(LmdbError::from)?
            .and_then(|b| b.try_into().ok().map(u64::from_be_bytes))
            .unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::Corruption("id sequence exhausted".into()))?;
        self.env
            .meta_db
            .put(&mut self.txn, key, &next.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(next)
    }
}

impl WriteBatch for LmdbWriteBatch<'_> {
    // ── Reads inside the batch ──────────────────────────────────────────

    fn get_user(&self, user_id: UserId) -> Result<UserRecord, StoreError> {
        let val = self
            .env
            .users_db
            .get(&self.txn, &user_key(user_id))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("user {user_id}")))?;
        Ok(bincode::deserialize(val).map_err(LmdbError::from)?)
    }

    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError> {
        let found = self
            .env
            .users_db
            .get(&self.txn, &user_key(user_id))
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn get_wallet(&self, wallet_id: WalletId) -> Result<WalletRecord, StoreError> {
        let val = self
            .env
            .wallets_db
            .get(&self.txn, &wallet_key(wallet_id))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("wallet {wallet_id}")))?;
        Ok(bincode::deserialize(val).map_err(LmdbError::from)?)
    }

    fn get_holding(&self, wallet_id: WalletId) -> Result<CurrencyHolding, StoreError> {
        let val = self
            .env
            .holdings_db
            .get(&self.txn, &wallet_key(wallet_id))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("holding for wallet {wallet_id}")))?;
        Ok(bincode::deserialize(val).map_err(LmdbError::from)?)
    }

    fn wallets_for_user(&self, user_id: UserId) -> Result<Vec<WalletRecord>, StoreError> {
        let (lower, upper) = user_prefix_bounds(user_id);
        let bounds = (
            lower.as_ref().map(|b| b.as_slice()),
            upper.as_ref().map(|b| b.as_slice()),
        );
        let iter = self
            .env
            .user_wallets_db
            .range(&self.txn, &bounds)
            .map_err(LmdbError::from)?;

        let mut keys = Vec::new();
        for result in iter {
            let (key, _val) = result.map_err(LmdbError::from)?;
            let wallet_bytes: [u8; 8] = key[8..]
                .try_into()
                .map_err(|_| LmdbError::Serialization("bad user_wallets key length".into()))?;
            keys.push(wallet_bytes);
        }

        let mut wallets = Vec::with_capacity(keys.len());
        for wallet_bytes in keys {
            let val = self
                .env
                .wallets_db
                .get(&self.txn, &wallet_bytes)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "user_wallets index points at missing wallet {}",
                        u64::from_be_bytes(wallet_bytes)
                    ))
                })?;
            wallets.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(wallets)
    }

    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users = Vec::new();
        let iter = self.env.users_db.iter(&self.txn).map_err(LmdbError::from)?;
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            users.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(users)
    }

    // ── Writes ──────────────────────────────────────────────────────────

    fn put_user(&mut self, record: &UserRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .users_db
            .put(&mut self.txn, &user_key(record.user_id), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        self.env
            .wallets_db
            .put(&mut self.txn, &wallet_key(record.wallet_id), &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .user_wallets_db
            .put(
                &mut self.txn,
                &user_wallet_key(record.user_id, record.wallet_id),
                &[],
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_holding(&mut self, holding: &CurrencyHolding) -> Result<(), StoreError> {
        let bytes = bincode::serialize(holding).map_err(LmdbError::from)?;
        self.env
            .holdings_db
            .put(&mut self.txn, &wallet_key(holding.wallet_id), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let key = transaction_key(record.transaction_id);
        self.env
            .transactions_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .user_txs_db
            .put(
                &mut self.txn,
                &user_tx_key(record.user_id, record.timestamp, record.transaction_id),
                &key,
            )
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Id sequences ────────────────────────────────────────────────────

    fn next_wallet_id(&mut self) -> Result<WalletId, StoreError> {
        self.next_sequence(SEQ_WALLET).map(WalletId::new)
    }

    fn next_transaction_id(&mut self) -> Result<TransactionId, StoreError> {
        self.next_sequence(SEQ_TRANSACTION).map(TransactionId::new)
    }

    fn next_transfer_id(&mut self) -> Result<TransferId, StoreError> {
        self.next_sequence(SEQ_TRANSFER).map(TransferId::new)
    }

    // ── Commit ──────────────────────────────────────────────────────────

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodia_store::batch::LedgerStore;
    use custodia_store::transaction::TransactionStore;
    use custodia_store::user::UserStore;
    use custodia_store::wallet::WalletStore;
    use custodia_types::{
        Amount, CurrencyType, Timestamp, TransactionStatus, TransactionType, Valuation,
    };
    use std::time::Duration;

    /// Helper: open a temporary LMDB environment.
    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024, Duration::from_secs(1))
            .expect("failed to open env");
        (dir, env)
    }

    fn wallet(id: u64, user: u64, currency: &str, balance: u128) -> WalletRecord {
        WalletRecord {
            wallet_id: WalletId::new(id),
            user_id: UserId::new(user),
            currency_type: CurrencyType::from(currency),
            balance: Amount::new(balance),
        }
    }

    fn tx_row(id: u64, user: u64, wallet: u64, ts: u64) -> TransactionRecord {
        TransactionRecord {
            transaction_id: TransactionId::new(id),
            transfer_id: None,
            user_id: UserId::new(user),
            wallet_id: WalletId::new(wallet),
            counterparty: None,
            currency_type: CurrencyType::from("Bitcoin"),
            amount: Amount::new(1),
            transaction_type: TransactionType::Deposit,
            status: TransactionStatus::Completed,
            timestamp: Timestamp::new(ts),
        }
    }

    #[test]
    fn batch_commit_makes_wallet_readable() {
        let (_dir, env) = temp_env();

        let mut batch = env.begin_write().expect("begin_write");
        batch.put_wallet(&wallet(1, 7, "Bitcoin", 2)).expect("put_wallet");
        batch.commit().expect("commit");

        let stored = env.get_wallet(WalletId::new(1)).expect("get_wallet");
        assert_eq!(stored.balance, Amount::new(2));
        assert_eq!(stored.user_id, UserId::new(7));

        let listed = env.wallets_for_user(UserId::new(7)).expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn dropped_batch_does_not_persist() {
        let (_dir, env) = temp_env();

        {
            let mut batch = env.begin_write().expect("begin_write");
            batch
                .put_wallet(&wallet(1, 7, "Bitcoin", 2))
                .expect("put_wallet");
            batch
                .put_user(&UserRecord {
                    user_id: UserId::new(7),
                    balance: Valuation::new(100_000),
                })
                .expect("put_user");
            // batch is dropped here — implicit rollback
        }

        assert!(env.get_wallet(WalletId::new(1)).is_err());
        assert!(!env.user_exists(UserId::new(7)).unwrap());
    }

    #[test]
    fn sequences_are_monotonic_across_batches() {
        let (_dir, env) = temp_env();

        let mut batch = env.begin_write().unwrap();
        assert_eq!(batch.next_wallet_id().unwrap(), WalletId::new(1));
        assert_eq!(batch.next_wallet_id().unwrap(), WalletId::new(2));
        batch.commit().unwrap();

        let mut batch = env.begin_write().unwrap();
        assert_eq!(batch.next_wallet_id().unwrap(), WalletId::new(3));
        // Independent counters.
        assert_eq!(batch.next_transaction_id().unwrap(), TransactionId::new(1));
        assert_eq!(batch.next_transfer_id().unwrap(), TransferId::new(1));
        batch.commit().unwrap();
    }

    #[test]
    fn uncommitted_sequence_is_rolled_back() {
        let (_dir, env) = temp_env();

        {
            let mut batch = env.begin_write().unwrap();
            assert_eq!(batch.next_wallet_id().unwrap(), WalletId::new(1));
        }

        let mut batch = env.begin_write().unwrap();
        assert_eq!(batch.next_wallet_id().unwrap(), WalletId::new(1));
        batch.commit().unwrap();
    }

    #[test]
    fn transactions_listed_newest_first() {
        let (_dir, env) = temp_env();

        let mut batch = env.begin_write().unwrap();
        batch.put_transaction(&tx_row(1, 7, 1, 100)).unwrap();
        batch.put_transaction(&tx_row(2, 7, 1, 300)).unwrap();
        batch.put_transaction(&tx_row(3, 7, 1, 200)).unwrap();
        // Same second as row 3: higher id wins the tie-break.
        batch.put_transaction(&tx_row(4, 7, 1, 200)).unwrap();
        batch.put_transaction(&tx_row(5, 9, 2, 400)).unwrap();
        batch.commit().unwrap();

        let rows = env.transactions_for_user(UserId::new(7)).unwrap();
        let ids: Vec<u64> = rows.iter().map(|r| r.transaction_id.raw()).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);

        let paged = env
            .transactions_for_user_paged(UserId::new(7), 1, 2)
            .unwrap();
        let ids: Vec<u64> = paged.iter().map(|r| r.transaction_id.raw()).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn batch_reads_see_own_writes() {
        let (_dir, env) = temp_env();

        let mut batch = env.begin_write().unwrap();
        batch.put_wallet(&wallet(1, 7, "Bitcoin", 5)).unwrap();
        let seen = batch.get_wallet(WalletId::new(1)).unwrap();
        assert_eq!(seen.balance, Amount::new(5));
        batch.commit().unwrap();
    }
}
