//! Wallet and currency-holding storage traits.

use crate::StoreError;
use custodia_types::{Amount, CurrencyType, UserId, WalletId};
use serde::{Deserialize, Serialize};

/// One wallet: a balance of a single currency owned by one user.
///
/// A user may hold several wallets of the same currency — creation does
/// not deduplicate. The reconciler sums across all of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub wallet_id: WalletId,
    pub user_id: UserId,
    pub currency_type: CurrencyType,
    pub balance: Amount,
}

/// The priced, symbol-bearing counterpart of a wallet (1:1).
///
/// `symbol` and `unit_value` are snapshotted from the catalog when the
/// wallet is created and do not track later catalog changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyHolding {
    pub wallet_id: WalletId,
    pub currency_type: CurrencyType,
    pub symbol: String,
    pub unit_value: u128,
}

/// Trait for wallet storage operations.
pub trait WalletStore {
    fn get_wallet(&self, wallet_id: WalletId) -> Result<WalletRecord, StoreError>;
    fn get_holding(&self, wallet_id: WalletId) -> Result<CurrencyHolding, StoreError>;

    /// All wallets owned by a user, in creation order (ascending wallet id).
    fn wallets_for_user(&self, user_id: UserId) -> Result<Vec<WalletRecord>, StoreError>;

    fn wallet_count(&self) -> Result<u64, StoreError>;
}
