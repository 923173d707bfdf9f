//! Nullable store — a thread-safe in-memory `LedgerStore`.
//!
//! Batches stage their mutations on a copy of the tables and swap it in
//! on commit, so a dropped batch leaves the store untouched — the same
//! all-or-nothing contract the LMDB backend gets from its transactions.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use custodia_store::batch::{LedgerStore, WriteBatch};
use custodia_store::transaction::{TransactionRecord, TransactionStore};
use custodia_store::user::{UserRecord, UserStore};
use custodia_store::wallet::{CurrencyHolding, WalletRecord, WalletStore};
use custodia_store::StoreError;
use custodia_types::{TransactionId, TransferId, UserId, WalletId};

#[derive(Clone, Debug, Default)]
struct Tables {
    users: BTreeMap<u64, UserRecord>,
    wallets: BTreeMap<u64, WalletRecord>,
    holdings: BTreeMap<u64, CurrencyHolding>,
    transactions: BTreeMap<u64, TransactionRecord>,
    seq_wallet: u64,
    seq_transaction: u64,
    seq_transfer: u64,
}

impl Tables {
    fn wallets_for_user(&self, user_id: UserId) -> Vec<WalletRecord> {
        // BTreeMap iteration is ascending wallet id, i.e. creation order.
        self.wallets
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect()
    }

    fn transactions_for_user(&self, user_id: UserId) -> Vec<TransactionRecord> {
        let mut rows: Vec<TransactionRecord> = self
            .transactions
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.transaction_id.cmp(&a.transaction_id))
        });
        rows
    }
}

/// An in-memory ledger store for testing.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    write_timeout: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_write_timeout(Duration::from_secs(1))
    }

    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            write_timeout,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Corruption(format!("store lock poisoned: {e}")))
    }

    fn lock_for_write(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        let deadline = Instant::now() + self.write_timeout;
        loop {
            match self.tables.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(e)) => {
                    return Err(StoreError::Corruption(format!("store lock poisoned: {e}")))
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::Busy(self.write_timeout.as_millis() as u64));
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for MemoryStore {
    fn get_user(&self, user_id: UserId) -> Result<UserRecord, StoreError> {
        self.lock()?
            .users
            .get(&user_id.raw())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))
    }

    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.lock()?
            .users
            .insert(record.user_id.raw(), record.clone());
        Ok(())
    }

    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self.lock()?.users.contains_key(&user_id.raw()))
    }

    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.users.len() as u64)
    }
}

impl WalletStore for MemoryStore {
    fn get_wallet(&self, wallet_id: WalletId) -> Result<WalletRecord, StoreError> {
        self.lock()?
            .wallets
            .get(&wallet_id.raw())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("wallet {wallet_id}")))
    }

    fn get_holding(&self, wallet_id: WalletId) -> Result<CurrencyHolding, StoreError> {
        self.lock()?
            .holdings
            .get(&wallet_id.raw())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("holding for wallet {wallet_id}")))
    }

    fn wallets_for_user(&self, user_id: UserId) -> Result<Vec<WalletRecord>, StoreError> {
        Ok(self.lock()?.wallets_for_user(user_id))
    }

    fn wallet_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.wallets.len() as u64)
    }
}

impl TransactionStore for MemoryStore {
    fn get_transaction(&self, id: TransactionId) -> Result<TransactionRecord, StoreError> {
        self.lock()?
            .transactions
            .get(&id.raw())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transaction {id}")))
    }

    fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self.lock()?.transactions_for_user(user_id))
    }

    fn transactions_for_user_paged(
        &self,
        user_id: UserId,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = self.lock()?.transactions_for_user(user_id);
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .collect())
    }

    fn transaction_count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.transactions.len() as u64)
    }
}

impl LedgerStore for MemoryStore {
    type Batch<'a> = MemoryBatch<'a>;

    fn begin_write(&self) -> Result<Self::Batch<'_>, StoreError> {
        let guard = self.lock_for_write()?;
        let staged = guard.clone();
        Ok(MemoryBatch { guard, staged })
    }
}

/// A batch over [`MemoryStore`]: mutations land on `staged` and replace
/// the live tables only on commit.
#[derive(Debug)]
pub struct MemoryBatch<'a> {
    guard: MutexGuard<'a, Tables>,
    staged: Tables,
}

impl WriteBatch for MemoryBatch<'_> {
    fn get_user(&self, user_id: UserId) -> Result<UserRecord, StoreError> {
        self.staged
            .users
            .get(&user_id.raw())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))
    }

    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self.staged.users.contains_key(&user_id.raw()))
    }

    fn get_wallet(&self, wallet_id: WalletId) -> Result<WalletRecord, StoreError> {
        self.staged
            .wallets
            .get(&wallet_id.raw())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("wallet {wallet_id}")))
    }

    fn get_holding(&self, wallet_id: WalletId) -> Result<CurrencyHolding, StoreError> {
        self.staged
            .holdings
            .get(&wallet_id.raw())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("holding for wallet {wallet_id}")))
    }

    fn wallets_for_user(&self, user_id: UserId) -> Result<Vec<WalletRecord>, StoreError> {
        Ok(self.staged.wallets_for_user(user_id))
    }

    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.staged.users.values().cloned().collect())
    }

    fn put_user(&mut self, record: &UserRecord) -> Result<(), StoreError> {
        self.staged
            .users
            .insert(record.user_id.raw(), record.clone());
        Ok(())
    }

    fn put_wallet(&mut self, record: &WalletRecord) -> Result<(), StoreError> {
        self.staged
            .wallets
            .insert(record.wallet_id.raw(), record.clone());
        Ok(())
    }

    fn put_holding(&mut self, holding: &CurrencyHolding) -> Result<(), StoreError> {
        self.staged
            .holdings
            .insert(holding.wallet_id.raw(), holding.clone());
        Ok(())
    }

    fn put_transaction(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        self.staged
            .transactions
            .insert(record.transaction_id.raw(), record.clone());
        Ok(())
    }

    fn next_wallet_id(&mut self) -> Result<WalletId, StoreError> {
        self.staged.seq_wallet += 1;
        Ok(WalletId::new(self.staged.seq_wallet))
    }

    fn next_transaction_id(&mut self) -> Result<TransactionId, StoreError> {
        self.staged.seq_transaction += 1;
        Ok(TransactionId::new(self.staged.seq_transaction))
    }

    fn next_transfer_id(&mut self) -> Result<TransferId, StoreError> {
        self.staged.seq_transfer += 1;
        Ok(TransferId::new(self.staged.seq_transfer))
    }

    fn commit(mut self) -> Result<(), StoreError> {
        *self.guard = self.staged;
        Ok(())
    }
}
