//! The Custodia ledger core.
//!
//! Owns the rules that keep a user's aggregate balance consistent with
//! their per-currency wallet holdings, and that move value between
//! wallets without corrupting that invariant under concurrent access:
//!
//! - wallet creation and priced reads ([`wallets`]),
//! - the balance reconciler, the only writer of `UserRecord::balance`
//!   ([`reconcile`]),
//! - the transfer/deposit engine, the only mutator of wallet balances
//!   after creation ([`engine`]),
//! - the transaction history read path ([`history`]).
//!
//! Every mutation runs inside one [`custodia_store::WriteBatch`], so a
//! reader never observes a debited sender without the matching credit.

pub mod engine;
pub mod error;
pub mod history;
pub mod reconcile;
pub mod wallets;

pub use error::LedgerError;
pub use wallets::WalletView;

use custodia_catalog::CurrencyCatalog;
use custodia_store::batch::LedgerStore;

/// The ledger service. Generic over the storage backend; the daemon runs
/// it on LMDB, tests on the in-memory nullable store.
pub struct Ledger<S: LedgerStore> {
    store: S,
    catalog: CurrencyCatalog,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S, catalog: CurrencyCatalog) -> Self {
        Self { store, catalog }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> &CurrencyCatalog {
        &self.catalog
    }
}
