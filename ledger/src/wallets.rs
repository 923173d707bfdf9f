//! Wallet creation and priced wallet reads.

use custodia_store::batch::{LedgerStore, WriteBatch};
use custodia_store::wallet::{CurrencyHolding, WalletRecord, WalletStore};
use custodia_store::StoreError;
use custodia_types::{Amount, CurrencyType, UserId, WalletId};
use serde::Serialize;

use crate::{Ledger, LedgerError};

/// A wallet joined with its currency symbol and reference unit value —
/// the shape wallet listings are served in.
#[derive(Clone, Debug, Serialize)]
pub struct WalletView {
    pub wallet_id: WalletId,
    pub user_id: UserId,
    pub currency_type: CurrencyType,
    pub balance: Amount,
    pub symbol: String,
    pub unit_value: u128,
}

impl WalletView {
    fn join(wallet: WalletRecord, holding: &CurrencyHolding) -> Self {
        Self {
            wallet_id: wallet.wallet_id,
            user_id: wallet.user_id,
            currency_type: wallet.currency_type,
            balance: wallet.balance,
            symbol: holding.symbol.clone(),
            unit_value: holding.unit_value,
        }
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Create a wallet (and its currency holding) for an existing user.
    ///
    /// The holding's symbol and unit value are snapshotted from the
    /// catalog. Unknown currencies are accepted with an empty symbol and
    /// a zero unit value rather than rejected. Nothing deduplicates by
    /// currency: a user may end up with several wallets of the same
    /// currency and every other component must cope with that.
    pub fn create_wallet(
        &self,
        user_id: UserId,
        currency_type: CurrencyType,
        initial_balance: Amount,
    ) -> Result<WalletId, LedgerError> {
        let info = self.catalog.lookup(&currency_type);
        if !self.catalog.is_known(&currency_type) {
            tracing::debug!(%currency_type, "creating wallet for uncataloged currency");
        }

        let mut batch = self.store.begin_write()?;
        if !batch.user_exists(user_id)? {
            return Err(LedgerError::UserNotFound(user_id));
        }

        let wallet_id = batch.next_wallet_id()?;
        batch.put_wallet(&WalletRecord {
            wallet_id,
            user_id,
            currency_type: currency_type.clone(),
            balance: initial_balance,
        })?;
        batch.put_holding(&CurrencyHolding {
            wallet_id,
            currency_type: currency_type.clone(),
            symbol: info.symbol,
            unit_value: info.unit_value,
        })?;
        batch.commit()?;

        tracing::info!(%user_id, %wallet_id, %currency_type, %initial_balance, "wallet created");
        Ok(wallet_id)
    }

    /// All wallets of a user, priced, in creation order.
    ///
    /// Reconciles the user's aggregate balance first so that anything
    /// read alongside the listing is consistent with the wallets being
    /// returned. An unknown user yields an empty list, like any user
    /// with no wallets.
    pub fn list_wallets(&self, user_id: UserId) -> Result<Vec<WalletView>, LedgerError> {
        match self.reconcile(user_id) {
            Ok(_) => {}
            Err(LedgerError::UserNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        }

        let wallets = self.store.wallets_for_user(user_id)?;
        let mut views = Vec::with_capacity(wallets.len());
        for wallet in wallets {
            let holding = self.store.get_holding(wallet.wallet_id)?;
            views.push(WalletView::join(wallet, &holding));
        }
        Ok(views)
    }

    /// A single priced wallet, or `WalletNotFound`.
    pub fn get_wallet(&self, wallet_id: WalletId) -> Result<WalletView, LedgerError> {
        let wallet = match self.store.get_wallet(wallet_id) {
            Ok(w) => w,
            Err(StoreError::NotFound(_)) => return Err(LedgerError::WalletNotFound(wallet_id)),
            Err(e) => return Err(e.into()),
        };
        let holding = self.store.get_holding(wallet_id)?;
        Ok(WalletView::join(wallet, &holding))
    }
}
