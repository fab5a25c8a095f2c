use redb::{Database as RedbDatabase, ReadTransaction, ReadableTable, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl From<redb::CommitError> for DatabaseError {
    fn from(e: redb::CommitError) -> Self {
        DatabaseError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for DatabaseError {
    fn from(e: redb::DatabaseError) -> Self {
        DatabaseError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for DatabaseError {
    fn from(e: redb::Error) -> Self {
        DatabaseError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(e: redb::StorageError) -> Self {
        DatabaseError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(e: redb::TableError) -> Self {
        DatabaseError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(e: redb::TransactionError) -> Self {
        DatabaseError::Transaction(Box::new(e))
    }
}

pub struct Database {
    db: Arc<RedbDatabase>,
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

/// Statistics from a purge operation
#[derive(Debug, Default)]
pub struct PurgeStats {
    pub submissions: u64,
    pub annotations: u64,
    pub messages: u64,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("textmining-api.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);

        // Initialize application tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SUBMISSIONS)?;
            let _ = write_txn.open_table(ANNOTATIONS)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(QUEUE_OUTBOX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Purge submissions, annotations and queued messages - for testing only.
    /// Users are kept so the caller can still authenticate.
    pub fn purge_all(&self) -> Result<PurgeStats, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut stats = PurgeStats::default();

        // Clear submissions
        {
            let table = write_txn.open_table(SUBMISSIONS)?;
            let keys: Vec<(String, String)> = table
                .iter()?
                .map(|r| {
                    r.map(|(k, _)| {
                        let (ft_id, user) = k.value();
                        (ft_id.to_string(), user.to_string())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(SUBMISSIONS)?;
            for (ft_id, user) in keys {
                table.remove((ft_id.as_str(), user.as_str()))?;
                stats.submissions += 1;
            }
        }

        // Clear annotations
        {
            let table = write_txn.open_table(ANNOTATIONS)?;
            let keys: Vec<(String, String, String)> = table
                .iter()?
                .map(|r| {
                    r.map(|(k, _)| {
                        let (ft_id, user, filename) = k.value();
                        (ft_id.to_string(), user.to_string(), filename.to_string())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(ANNOTATIONS)?;
            for (ft_id, user, filename) in keys {
                table.remove((ft_id.as_str(), user.as_str(), filename.as_str()))?;
                stats.annotations += 1;
            }
        }

        // Clear outbox
        {
            let table = write_txn.open_table(QUEUE_OUTBOX)?;
            let keys: Vec<(String, u64)> = table
                .iter()?
                .map(|r| {
                    r.map(|(k, _)| {
                        let (queue, seq) = k.value();
                        (queue.to_string(), seq)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            drop(table);

            let mut table = write_txn.open_table(QUEUE_OUTBOX)?;
            for (queue, seq) in keys {
                table.remove((queue.as_str(), seq))?;
                stats.messages += 1;
            }
        }

        write_txn.commit()?;
        Ok(stats)
    }
}
