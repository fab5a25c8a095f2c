use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::UserRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    pub fn put_user(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        debug_assert!(!user.username.is_empty(), "username must not be empty");

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(USERS)?;
            let data = rmp_serde::to_vec_named(user)?;
            table.insert(user.username.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(username)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }
}
