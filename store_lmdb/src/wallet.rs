//! LMDB implementation of WalletStore.

use custodia_store::wallet::{CurrencyHolding, WalletRecord, WalletStore};
use custodia_store::StoreError;
use custodia_types::{UserId, WalletId};

use crate::environment::LmdbEnvironment;
use crate::keys::{user_prefix_bounds, wallet_key};
use crate::LmdbError;

impl WalletStore for LmdbEnvironment {
    fn get_wallet(&self, wallet_id: WalletId) -> Result<WalletRecord, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .wallets_db
            .get(&rtxn, &wallet_key(wallet_id))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("wallet {wallet_id}")))?;
        let record: WalletRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn get_holding(&self, wallet_id: WalletId) -> Result<CurrencyHolding, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .holdings_db
            .get(&rtxn, &wallet_key(wallet_id))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("holding for wallet {wallet_id}")))?;
        let holding: CurrencyHolding = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(holding)
    }

    fn wallets_for_user(&self, user_id: UserId) -> Result<Vec<WalletRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let (lower, upper) = user_prefix_bounds(user_id);
        let bounds = (
            lower.as_ref().map(|b| b.as_slice()),
            upper.as_ref().map(|b| b.as_slice()),
        );
        let iter = self
            .user_wallets_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;

        // Index entries are `user_id ++ wallet_id`; the wallet record
        // itself lives in wallets_db.
        let mut wallets = Vec::new();
        for result in iter {
            let (key, _val) = result.map_err(LmdbError::from)?;
            let wallet_bytes: [u8; 8] = key[8..]
                .try_into()
                .map_err(|_| LmdbError::Serialization("bad user_wallets key length".into()))?;
            let val = self
                .wallets_db
                .get(&rtxn, &wallet_bytes)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "user_wallets index points at missing wallet {}",
                        u64::from_be_bytes(wallet_bytes)
                    ))
                })?;
            let record: WalletRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            wallets.push(record);
        }
        Ok(wallets)
    }

    fn wallet_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let count = self.wallets_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
