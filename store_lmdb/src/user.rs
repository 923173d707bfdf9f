//! LMDB implementation of UserStore.

use custodia_store::user::{UserRecord, UserStore};
use custodia_store::StoreError;
use custodia_types::UserId;

use crate::environment::LmdbEnvironment;
use crate::keys::user_key;
use crate::LmdbError;

impl UserStore for LmdbEnvironment {
    fn get_user(&self, user_id: UserId) -> Result<UserRecord, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .users_db
            .get(&rtxn, &user_key(user_id))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("user {user_id}")))?;
        let record: UserRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.users_db
            .put(&mut wtxn, &user_key(record.user_id), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn user_exists(&self, user_id: UserId) -> Result<bool, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let found = self
            .users_db
            .get(&rtxn, &user_key(user_id))
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let mut users = Vec::new();
        let iter = self.users_db.iter(&rtxn).map_err(LmdbError::from)?;
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let record: UserRecord = bincode::deserialize(val).map_err(LmdbError::from)?;
            users.push(record);
        }
        Ok(users)
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let count = self.users_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
