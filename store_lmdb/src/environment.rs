//! LMDB environment setup.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use custodia_store::batch::LedgerStore;
use custodia_store::StoreError;

use crate::write_batch::LmdbWriteBatch;
use crate::LmdbError;

const MAX_DBS: u32 = 7;

/// Wraps the LMDB environment and all database handles.
///
/// LMDB allows one write transaction at a time; [`Self::begin_write`]
/// fronts it with an in-process lock so a waiter gives up with
/// [`StoreError::Busy`] after `write_timeout` instead of blocking
/// indefinitely behind a stuck writer.
pub struct LmdbEnvironment {
    env: Env,
    pub(crate) users_db: Database<Bytes, Bytes>,
    pub(crate) wallets_db: Database<Bytes, Bytes>,
    pub(crate) holdings_db: Database<Bytes, Bytes>,
    pub(crate) user_wallets_db: Database<Bytes, Bytes>,
    pub(crate) transactions_db: Database<Bytes, Bytes>,
    pub(crate) user_txs_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
    write_lock: Mutex<()>,
    write_timeout: Duration,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(
        path: &Path,
        map_size: usize,
        write_timeout: Duration,
    ) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)
            .map_err(|e| StoreError::Backend(format!("create data dir: {e}")))?;

        // Safety contract (heed): no other process may resize or remove
        // the map while this environment is open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)
                .map_err(LmdbError::from)?
        };

        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let users_db = env
            .create_database(&mut wtxn, Some("users"))
            .map_err(LmdbError::from)?;
        let wallets_db = env
            .create_database(&mut wtxn, Some("wallets"))
            .map_err(LmdbError::from)?;
        let holdings_db = env
            .create_database(&mut wtxn, Some("holdings"))
            .map_err(LmdbError::from)?;
        let user_wallets_db = env
            .create_database(&mut wtxn, Some("user_wallets"))
            .map_err(LmdbError::from)?;
        let transactions_db = env
            .create_database(&mut wtxn, Some("transactions"))
            .map_err(LmdbError::from)?;
        let user_txs_db = env
            .create_database(&mut wtxn, Some("user_txs"))
            .map_err(LmdbError::from)?;
        let meta_db = env
            .create_database(&mut wtxn, Some("meta"))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env,
            users_db,
            wallets_db,
            holdings_db,
            user_wallets_db,
            transactions_db,
            user_txs_db,
            meta_db,
            write_lock: Mutex::new(()),
            write_timeout,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Acquire the writer slot, waiting at most `write_timeout`.
    pub(crate) fn acquire_write(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        let deadline = Instant::now() + self.write_timeout;
        loop {
            match self.write_lock.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(e)) => {
                    return Err(StoreError::Corruption(format!("write lock poisoned: {e}")))
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

impl LedgerStore for LmdbEnvironment {
    type Batch<'a> = LmdbWriteBatch<'a>;

    fn begin_write(&self) -> Result<Self::Batch<'_>, StoreError> {
        LmdbWriteBatch::new(self)
    }
}
