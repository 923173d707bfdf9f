//! Transaction history reads.

use custodia_store::batch::LedgerStore;
use custodia_store::transaction::TransactionRecord;
use custodia_types::UserId;

use crate::{Ledger, LedgerError};

impl<S: LedgerStore> Ledger<S> {
    /// Every ledger row owned by `user_id`, newest first. A user with no
    /// history (or one the store has never seen) gets an empty list.
    pub fn list_transactions(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, LedgerError> {
        Ok(self.store.transactions_for_user(user_id)?)
    }

    /// A page of history: up to `limit` rows starting `offset` rows into
    /// the newest-first ordering.
    pub fn list_transactions_paged(
        &self,
        user_id: UserId,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        Ok(self
            .store
            .transactions_for_user_paged(user_id, offset, limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodia_catalog::CurrencyCatalog;
    use custodia_nullables::MemoryStore;
    use custodia_store::user::{UserRecord, UserStore};
    use custodia_types::{Amount, CurrencyType, TransactionType};

    fn ledger_with_users(users: &[u64]) -> Ledger<MemoryStore> {
        let store = MemoryStore::new();
        for &u in users {
            store.put_user(&UserRecord::new(UserId::new(u))).unwrap();
        }
        Ledger::new(store, CurrencyCatalog::builtin())
    }

    #[test]
    fn history_is_newest_first_and_per_user() {
        let ledger = ledger_with_users(&[1, 2]);
        let wallet = ledger
            .create_wallet(UserId::new(1), CurrencyType::from("Bitcoin"), Amount::new(10))
            .unwrap();

        ledger.deposit(wallet, Amount::new(1)).unwrap();
        ledger.transfer(wallet, UserId::new(2), Amount::new(2)).unwrap();

        let mine = ledger.list_transactions(UserId::new(1)).unwrap();
        assert_eq!(mine.len(), 2);
        // Same-timestamp rows fall back to id-descending: the Send row
        // was appended after the deposit.
        assert_eq!(mine[0].transaction_type, TransactionType::Send);
        assert_eq!(mine[1].transaction_type, TransactionType::Deposit);

        let theirs = ledger.list_transactions(UserId::new(2)).unwrap();
        assert_eq!(theirs.len(), 1);
        assert_eq!(theirs[0].transaction_type, TransactionType::Receive);
    }

    #[test]
    fn empty_history_is_not_an_error() {
        let ledger = ledger_with_users(&[1]);
        assert!(ledger.list_transactions(UserId::new(1)).unwrap().is_empty());
        assert!(ledger.list_transactions(UserId::new(77)).unwrap().is_empty());
    }

    #[test]
    fn paging_walks_the_same_ordering() {
        let ledger = ledger_with_users(&[1]);
        let wallet = ledger
            .create_wallet(UserId::new(1), CurrencyType::from("Bitcoin"), Amount::ZERO)
            .unwrap();
        for _ in 0..5 {
            ledger.deposit(wallet, Amount::new(1)).unwrap();
        }

        let all = ledger.list_transactions(UserId::new(1)).unwrap();
        let first = ledger.list_transactions_paged(UserId::new(1), 0, 2).unwrap();
        let second = ledger.list_transactions_paged(UserId::new(1), 2, 2).unwrap();
        let tail = ledger.list_transactions_paged(UserId::new(1), 4, 2).unwrap();

        assert_eq!(first.as_slice(), &all[0..2]);
        assert_eq!(second.as_slice(), &all[2..4]);
        assert_eq!(tail.as_slice(), &all[4..5]);
        assert!(ledger
            .list_transactions_paged(UserId::new(1), 10, 2)
            .unwrap()
            .is_empty());
    }
}
