//! Abstract storage traits for the Custodia ledger.
//!
//! Every storage backend (LMDB for the daemon, in-memory for testing)
//! implements these traits. The ledger core depends only on the traits.
//!
//! Reads go through the per-entity stores and observe a consistent
//! snapshot. All mutations go through a [`WriteBatch`], which commits
//! atomically or not at all.

pub mod batch;
pub mod error;
pub mod transaction;
pub mod user;
pub mod wallet;

pub use batch::{LedgerStore, WriteBatch};
pub use error::StoreError;
pub use transaction::{TransactionRecord, TransactionStore};
pub use user::{UserRecord, UserStore};
pub use wallet::{CurrencyHolding, WalletRecord, WalletStore};
