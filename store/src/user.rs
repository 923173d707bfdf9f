//! User storage trait.

use crate::StoreError;
use custodia_types::{UserId, Valuation};
use serde::{Deserialize, Serialize};

/// Per-user record.
///
/// `balance` is a derived cache of the user's wallet holdings valued at
/// catalog prices. The wallets are the source of truth; only the
/// reconciler writes this field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub balance: Valuation,
}

impl UserRecord {
    /// A fresh user with nothing reconciled yet.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Valuation::ZERO,
        }
    }
}

/// Trait for user storage operations.
///
/// User creation belongs to the external registration collaborator;
/// `put_user` exists for that collaborator (and for test setup), not for
/// the ledger core, which only reads users and reconciles their balance.
pub trait UserStore {
    fn get_user(&self, user_id: UserId) -> Result<UserRecord, StoreError>;
    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError>;
    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError>;
    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError>;
    fn user_count(&self) -> Result<u64, StoreError>;
}
