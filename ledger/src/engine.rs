//! The transfer/deposit engine.
//!
//! After creation, wallet balances change only through the two entry
//! points here. Each runs in one write batch: the funds check, the
//! balance updates, and the ledger rows commit together or not at all.

use custodia_store::batch::{LedgerStore, WriteBatch};
use custodia_store::transaction::TransactionRecord;
use custodia_store::wallet::{CurrencyHolding, WalletRecord};
use custodia_store::StoreError;
use custodia_types::{
    Amount, Timestamp, TransactionId, TransactionStatus, TransactionType, TransferId, UserId,
    WalletId,
};

use crate::{Ledger, LedgerError};

fn wallet_in_batch<B: WriteBatch>(
    batch: &B,
    wallet_id: WalletId,
) -> Result<WalletRecord, LedgerError> {
    match batch.get_wallet(wallet_id) {
        Ok(w) => Ok(w),
        Err(StoreError::NotFound(_)) => Err(LedgerError::WalletNotFound(wallet_id)),
        Err(e) => Err(e.into()),
    }
}

impl<S: LedgerStore> Ledger<S> {
    /// Credit a wallet and append one `Deposit` row.
    pub fn deposit(
        &self,
        wallet_id: WalletId,
        amount: Amount,
    ) -> Result<TransactionId, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut batch = self.store.begin_write()?;
        let mut wallet = wallet_in_batch(&batch, wallet_id)?;
        wallet.balance = wallet
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        batch.put_wallet(&wallet)?;

        let transaction_id = batch.next_transaction_id()?;
        batch.put_transaction(&TransactionRecord {
            transaction_id,
            transfer_id: None,
            user_id: wallet.user_id,
            wallet_id,
            counterparty: None,
            currency_type: wallet.currency_type.clone(),
            amount,
            transaction_type: TransactionType::Deposit,
            status: TransactionStatus::Completed,
            timestamp: Timestamp::now(),
        })?;
        batch.commit()?;

        tracing::info!(%wallet_id, %amount, %transaction_id, "deposit completed");
        Ok(transaction_id)
    }

    /// Move `amount` from a wallet to another user, recording a `Send`
    /// row for the sender and a `Receive` row for the recipient under a
    /// shared transfer id.
    ///
    /// The recipient's wallet is resolved by the source's currency; among
    /// several, the oldest (lowest id) wins. A recipient without one gets
    /// a zero-balance wallet created inside the same batch, so a transfer
    /// never fails for lack of a destination.
    pub fn transfer(
        &self,
        source_wallet_id: WalletId,
        recipient_user_id: UserId,
        amount: Amount,
    ) -> Result<TransferId, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut batch = self.store.begin_write()?;
        let mut source = wallet_in_batch(&batch, source_wallet_id)?;
        if !batch.user_exists(recipient_user_id)? {
            return Err(LedgerError::UserNotFound(recipient_user_id));
        }

        let available = source.balance;
        source.balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                needed: amount,
                available,
            })?;

        let recipient_wallet_id = match batch
            .wallets_for_user(recipient_user_id)?
            .into_iter()
            .find(|w| w.currency_type == source.currency_type)
        {
            Some(w) => w.wallet_id,
            None => {
                let info = self.catalog.lookup(&source.currency_type);
                let wallet_id = batch.next_wallet_id()?;
                batch.put_wallet(&WalletRecord {
                    wallet_id,
                    user_id: recipient_user_id,
                    currency_type: source.currency_type.clone(),
                    balance: Amount::ZERO,
                })?;
                batch.put_holding(&CurrencyHolding {
                    wallet_id,
                    currency_type: source.currency_type.clone(),
                    symbol: info.symbol,
                    unit_value: info.unit_value,
                })?;
                tracing::debug!(%recipient_user_id, %wallet_id, "auto-created recipient wallet");
                wallet_id
            }
        };

        if recipient_wallet_id == source_wallet_id {
            // Transfer into the source wallet itself: credit the debited
            // record, never a stale copy read before the debit.
            source.balance = source
                .balance
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
            batch.put_wallet(&source)?;
        } else {
            batch.put_wallet(&source)?;
            let mut recipient = wallet_in_batch(&batch, recipient_wallet_id)?;
            recipient.balance = recipient
                .balance
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
            batch.put_wallet(&recipient)?;
        }

        let transfer_id = batch.next_transfer_id()?;
        let timestamp = Timestamp::now();
        let send_id = batch.next_transaction_id()?;
        batch.put_transaction(&TransactionRecord {
            transaction_id: send_id,
            transfer_id: Some(transfer_id),
            user_id: source.user_id,
            wallet_id: source_wallet_id,
            counterparty: Some(recipient_user_id),
            currency_type: source.currency_type.clone(),
            amount,
            transaction_type: TransactionType::Send,
            status: TransactionStatus::Completed,
            timestamp,
        })?;
        let receive_id = batch.next_transaction_id()?;
        batch.put_transaction(&TransactionRecord {
            transaction_id: receive_id,
            transfer_id: Some(transfer_id),
            user_id: recipient_user_id,
            wallet_id: recipient_wallet_id,
            counterparty: Some(source.user_id),
            currency_type: source.currency_type.clone(),
            amount,
            transaction_type: TransactionType::Receive,
            status: TransactionStatus::Completed,
            timestamp,
        })?;
        batch.commit()?;

        tracing::info!(
            %source_wallet_id,
            %recipient_user_id,
            %amount,
            %transfer_id,
            "transfer completed"
        );
        Ok(transfer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodia_catalog::CurrencyCatalog;
    use custodia_nullables::MemoryStore;
    use custodia_store::transaction::TransactionStore;
    use custodia_store::user::{UserRecord, UserStore};
    use custodia_store::wallet::WalletStore;
    use custodia_types::CurrencyType;

    fn ledger_with_users(users: &[u64]) -> Ledger<MemoryStore> {
        let store = MemoryStore::new();
        for &u in users {
            store.put_user(&UserRecord::new(UserId::new(u))).unwrap();
        }
        Ledger::new(store, CurrencyCatalog::builtin())
    }

    fn btc(amount: u128) -> (CurrencyType, Amount) {
        (CurrencyType::from("Bitcoin"), Amount::new(amount))
    }

    #[test]
    fn deposit_credits_and_records() {
        let ledger = ledger_with_users(&[1]);
        let (cur, bal) = btc(3);
        let wallet = ledger.create_wallet(UserId::new(1), cur, bal).unwrap();

        let tx = ledger.deposit(wallet, Amount::new(2)).unwrap();

        assert_eq!(
            ledger.store().get_wallet(wallet).unwrap().balance,
            Amount::new(5)
        );
        let row = ledger.store().get_transaction(tx).unwrap();
        assert_eq!(row.transaction_type, TransactionType::Deposit);
        assert_eq!(row.status, TransactionStatus::Completed);
        assert_eq!(row.amount, Amount::new(2));
        assert_eq!(row.transfer_id, None);
        assert_eq!(row.counterparty, None);
    }

    #[test]
    fn deposit_rejects_zero_amount() {
        let ledger = ledger_with_users(&[1]);
        let (cur, bal) = btc(0);
        let wallet = ledger.create_wallet(UserId::new(1), cur, bal).unwrap();

        assert!(matches!(
            ledger.deposit(wallet, Amount::ZERO),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(ledger.store().transaction_count().unwrap(), 0);
    }

    #[test]
    fn deposit_into_missing_wallet_fails() {
        let ledger = ledger_with_users(&[1]);
        assert!(matches!(
            ledger.deposit(WalletId::new(9), Amount::new(1)),
            Err(LedgerError::WalletNotFound(_))
        ));
    }

    #[test]
    fn transfer_moves_funds_and_pairs_rows() {
        let ledger = ledger_with_users(&[1, 2]);
        let (cur, bal) = btc(10);
        let source = ledger.create_wallet(UserId::new(1), cur.clone(), bal).unwrap();
        let dest = ledger
            .create_wallet(UserId::new(2), cur, Amount::new(1))
            .unwrap();

        ledger.transfer(source, UserId::new(2), Amount::new(4)).unwrap();

        assert_eq!(
            ledger.store().get_wallet(source).unwrap().balance,
            Amount::new(6)
        );
        assert_eq!(
            ledger.store().get_wallet(dest).unwrap().balance,
            Amount::new(5)
        );

        let sender_rows = ledger.store().transactions_for_user(UserId::new(1)).unwrap();
        let recipient_rows = ledger.store().transactions_for_user(UserId::new(2)).unwrap();
        assert_eq!(sender_rows.len(), 1);
        assert_eq!(recipient_rows.len(), 1);
        assert_eq!(sender_rows[0].transaction_type, TransactionType::Send);
        assert_eq!(recipient_rows[0].transaction_type, TransactionType::Receive);
        assert_eq!(sender_rows[0].transfer_id, recipient_rows[0].transfer_id);
        assert!(sender_rows[0].transfer_id.is_some());
        assert_eq!(sender_rows[0].counterparty, Some(UserId::new(2)));
        assert_eq!(recipient_rows[0].counterparty, Some(UserId::new(1)));
    }

    #[test]
    fn transfer_auto_creates_recipient_wallet() {
        let ledger = ledger_with_users(&[1, 2]);
        let (cur, bal) = btc(10);
        let source = ledger.create_wallet(UserId::new(1), cur, bal).unwrap();

        ledger.transfer(source, UserId::new(2), Amount::new(3)).unwrap();

        let wallets = ledger.store().wallets_for_user(UserId::new(2)).unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].currency_type, CurrencyType::from("Bitcoin"));
        assert_eq!(wallets[0].balance, Amount::new(3));
        // The holding was snapshotted too.
        let holding = ledger.store().get_holding(wallets[0].wallet_id).unwrap();
        assert_eq!(holding.symbol, "₿");
    }

    #[test]
    fn transfer_picks_oldest_matching_recipient_wallet() {
        let ledger = ledger_with_users(&[1, 2]);
        let (cur, _) = btc(0);
        let source = ledger
            .create_wallet(UserId::new(1), cur.clone(), Amount::new(5))
            .unwrap();
        let older = ledger
            .create_wallet(UserId::new(2), cur.clone(), Amount::ZERO)
            .unwrap();
        let newer = ledger.create_wallet(UserId::new(2), cur, Amount::ZERO).unwrap();

        ledger.transfer(source, UserId::new(2), Amount::new(5)).unwrap();

        assert_eq!(
            ledger.store().get_wallet(older).unwrap().balance,
            Amount::new(5)
        );
        assert_eq!(
            ledger.store().get_wallet(newer).unwrap().balance,
            Amount::ZERO
        );
    }

    #[test]
    fn overdraw_fails_and_changes_nothing() {
        let ledger = ledger_with_users(&[1, 2]);
        let (cur, bal) = btc(3);
        let source = ledger.create_wallet(UserId::new(1), cur, bal).unwrap();

        let err = ledger
            .transfer(source, UserId::new(2), Amount::new(4))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                needed,
                available,
            } if needed == Amount::new(4) && available == Amount::new(3)
        ));

        assert_eq!(
            ledger.store().get_wallet(source).unwrap().balance,
            Amount::new(3)
        );
        assert_eq!(ledger.store().transaction_count().unwrap(), 0);
        assert!(ledger.store().wallets_for_user(UserId::new(2)).unwrap().is_empty());
    }

    #[test]
    fn self_transfer_preserves_balance() {
        let ledger = ledger_with_users(&[1]);
        let (cur, bal) = btc(8);
        let wallet = ledger.create_wallet(UserId::new(1), cur, bal).unwrap();

        ledger.transfer(wallet, UserId::new(1), Amount::new(5)).unwrap();

        assert_eq!(
            ledger.store().get_wallet(wallet).unwrap().balance,
            Amount::new(8)
        );
        // Both halves still recorded, in the same user's history.
        let rows = ledger.store().transactions_for_user(UserId::new(1)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].transfer_id, rows[1].transfer_id);
    }

    #[test]
    fn transfer_to_unknown_user_fails() {
        let ledger = ledger_with_users(&[1]);
        let (cur, bal) = btc(5);
        let source = ledger.create_wallet(UserId::new(1), cur, bal).unwrap();

        assert!(matches!(
            ledger.transfer(source, UserId::new(99), Amount::new(1)),
            Err(LedgerError::UserNotFound(_))
        ));
        assert_eq!(
            ledger.store().get_wallet(source).unwrap().balance,
            Amount::new(5)
        );
    }

    #[test]
    fn transfer_rejects_zero_amount() {
        let ledger = ledger_with_users(&[1, 2]);
        let (cur, bal) = btc(5);
        let source = ledger.create_wallet(UserId::new(1), cur, bal).unwrap();

        assert!(matches!(
            ledger.transfer(source, UserId::new(2), Amount::ZERO),
            Err(LedgerError::InvalidAmount(_))
        ));
    }
}
