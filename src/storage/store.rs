use async_trait::async_trait;

use super::db::{Database, DatabaseError};
use super::models::{Annotations, Submission};

/// Document store used by the validator and the submission service.
///
/// Every lookup is by natural key (`ft_id`, `user`, `filename`), never by
/// surrogate id. Whether writes span one or several transactions is a
/// deployment choice of the implementation and is invisible to callers.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_submission(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<Option<Submission>, DatabaseError>;
    async fn find_submissions(&self, ft_id: &str) -> Result<Vec<Submission>, DatabaseError>;
    async fn find_annotations(
        &self,
        ft_id: &str,
        user: &str,
        filename: &str,
    ) -> Result<Option<Annotations>, DatabaseError>;
    async fn list_annotations(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<Vec<Annotations>, DatabaseError>;
    async fn store_submission(&self, submission: &Submission) -> Result<(), DatabaseError>;
    async fn delete_submission(&self, ft_id: &str, user: &str) -> Result<(), DatabaseError>;
}

/// redb-backed store.
pub struct RedbStore {
    db: Database,
    transactional: bool,
}

impl RedbStore {
    /// `transactional` selects whether multi-table writes commit atomically.
    pub fn new(db: Database, transactional: bool) -> Self {
        Self { db, transactional }
    }
}

#[async_trait]
impl SubmissionStore for RedbStore {
    async fn find_submission(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<Option<Submission>, DatabaseError> {
        self.db.get_submission(ft_id, user)
    }

    async fn find_submissions(&self, ft_id: &str) -> Result<Vec<Submission>, DatabaseError> {
        self.db.get_submissions_by_ft_id(ft_id)
    }

    async fn find_annotations(
        &self,
        ft_id: &str,
        user: &str,
        filename: &str,
    ) -> Result<Option<Annotations>, DatabaseError> {
        self.db.get_annotations(ft_id, user, filename)
    }

    async fn list_annotations(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<Vec<Annotations>, DatabaseError> {
        self.db.list_annotations(ft_id, user)
    }

    async fn store_submission(&self, submission: &Submission) -> Result<(), DatabaseError> {
        // A submission lives in a single table, so both modes write it the same way.
        self.db.put_submission(submission)?;
        Ok(())
    }

    async fn delete_submission(&self, ft_id: &str, user: &str) -> Result<(), DatabaseError> {
        self.db.delete_submission(ft_id, user, self.transactional)?;
        Ok(())
    }
}
