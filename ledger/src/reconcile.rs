//! Balance reconciliation.
//!
//! A user's `balance` field is a cache: the sum of every wallet's amount
//! multiplied by the unit value snapshotted in the wallet's holding. The
//! wallets are authoritative. The functions here recompute the cache
//! from the wallets and are the only place that writes it back.

use custodia_store::batch::{LedgerStore, WriteBatch};
use custodia_store::user::UserRecord;
use custodia_types::{UserId, Valuation};

use crate::{Ledger, LedgerError};

/// Value a user's wallets at their holdings' snapshot prices, reading
/// through `batch` so the figure matches what the batch will commit.
fn valuation_in_batch<B: WriteBatch>(batch: &B, user_id: UserId) -> Result<Valuation, LedgerError> {
    let mut total = Valuation::ZERO;
    for wallet in batch.wallets_for_user(user_id)? {
        let holding = batch.get_holding(wallet.wallet_id)?;
        let value = wallet
            .balance
            .checked_value(holding.unit_value)
            .ok_or(LedgerError::Overflow)?;
        total = total.checked_add(value).ok_or(LedgerError::Overflow)?;
    }
    Ok(total)
}

impl<S: LedgerStore> Ledger<S> {
    /// Recompute one user's aggregate balance from their wallets and
    /// store it. Returns the fresh figure. Idempotent: reconciling twice
    /// in a row writes the same value both times.
    pub fn reconcile(&self, user_id: UserId) -> Result<Valuation, LedgerError> {
        let mut batch = self.store.begin_write()?;
        if !batch.user_exists(user_id)? {
            return Err(LedgerError::UserNotFound(user_id));
        }

        let total = valuation_in_batch(&batch, user_id)?;
        batch.put_user(&UserRecord {
            user_id,
            balance: total,
        })?;
        batch.commit()?;

        tracing::debug!(%user_id, balance = %total, "reconciled user balance");
        Ok(total)
    }

    /// Reconcile every known user in one batch. Returns how many users
    /// were recomputed.
    pub fn reconcile_all(&self) -> Result<u64, LedgerError> {
        let mut batch = self.store.begin_write()?;
        let users = batch.iter_users()?;
        let count = users.len() as u64;
        for user in users {
            let total = valuation_in_batch(&batch, user.user_id)?;
            batch.put_user(&UserRecord {
                user_id: user.user_id,
                balance: total,
            })?;
        }
        batch.commit()?;

        tracing::debug!(users = count, "reconciled all user balances");
        Ok(count)
    }

    /// A user's aggregate balance. Always reconciles before answering,
    /// so the caller never sees a stale cache.
    pub fn user_balance(&self, user_id: UserId) -> Result<Valuation, LedgerError> {
        self.reconcile(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodia_catalog::CurrencyCatalog;
    use custodia_nullables::MemoryStore;
    use custodia_store::user::UserStore;
    use custodia_types::{Amount, CurrencyType};

    fn ledger_with_user(user: u64) -> Ledger<MemoryStore> {
        let store = MemoryStore::new();
        store
            .put_user(&UserRecord::new(UserId::new(user)))
            .unwrap();
        Ledger::new(store, CurrencyCatalog::builtin())
    }

    #[test]
    fn valuation_sums_wallets_at_snapshot_prices() {
        let ledger = ledger_with_user(1);
        ledger
            .create_wallet(UserId::new(1), CurrencyType::from("Bitcoin"), Amount::new(2))
            .unwrap();
        ledger
            .create_wallet(UserId::new(1), CurrencyType::from("Ethereum"), Amount::new(10))
            .unwrap();

        // 2 * 50_000 + 10 * 3_000
        assert_eq!(
            ledger.reconcile(UserId::new(1)).unwrap(),
            Valuation::new(130_000)
        );
        assert_eq!(
            ledger.store().get_user(UserId::new(1)).unwrap().balance,
            Valuation::new(130_000)
        );
    }

    #[test]
    fn reconcile_is_idempotent() {
        let ledger = ledger_with_user(1);
        ledger
            .create_wallet(UserId::new(1), CurrencyType::from("Litecoin"), Amount::new(4))
            .unwrap();

        let first = ledger.reconcile(UserId::new(1)).unwrap();
        let second = ledger.reconcile(UserId::new(1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Valuation::new(600));
    }

    #[test]
    fn unknown_currency_contributes_zero() {
        let ledger = ledger_with_user(1);
        ledger
            .create_wallet(UserId::new(1), CurrencyType::from("Dogecoin"), Amount::new(1_000))
            .unwrap();

        assert_eq!(ledger.reconcile(UserId::new(1)).unwrap(), Valuation::ZERO);
    }

    #[test]
    fn reconcile_unknown_user_fails() {
        let ledger = ledger_with_user(1);
        assert!(matches!(
            ledger.reconcile(UserId::new(9)),
            Err(LedgerError::UserNotFound(_))
        ));
    }

    #[test]
    fn reconcile_all_touches_every_user() {
        let store = MemoryStore::new();
        store.put_user(&UserRecord::new(UserId::new(1))).unwrap();
        store.put_user(&UserRecord::new(UserId::new(2))).unwrap();
        let ledger = Ledger::new(store, CurrencyCatalog::builtin());

        ledger
            .create_wallet(UserId::new(1), CurrencyType::from("Bitcoin"), Amount::new(1))
            .unwrap();
        ledger
            .create_wallet(UserId::new(2), CurrencyType::from("Litecoin"), Amount::new(2))
            .unwrap();

        assert_eq!(ledger.reconcile_all().unwrap(), 2);
        assert_eq!(
            ledger.store().get_user(UserId::new(1)).unwrap().balance,
            Valuation::new(50_000)
        );
        assert_eq!(
            ledger.store().get_user(UserId::new(2)).unwrap().balance,
            Valuation::new(300)
        );
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let ledger = ledger_with_user(1);
        ledger
            .create_wallet(
                UserId::new(1),
                CurrencyType::from("Bitcoin"),
                Amount::new(u128::MAX),
            )
            .unwrap();

        assert!(matches!(
            ledger.reconcile(UserId::new(1)),
            Err(LedgerError::Overflow)
        ));
    }
}
