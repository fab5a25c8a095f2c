use chrono::Utc;
use redb::{ReadableTable, WriteTransaction};

use super::db::{Database, DatabaseError};
use super::models::Submission;
use super::tables::*;

impl Database {
    // ========================================================================
    // Submission operations
    // ========================================================================

    /// Insert or replace the submission stored under `(ft_id, user)`.
    ///
    /// A missing surrogate id or insertion timestamp is assigned here; the
    /// modification timestamp is always refreshed. Returns the record as
    /// written.
    pub fn put_submission(&self, submission: &Submission) -> Result<Submission, DatabaseError> {
        debug_assert!(!submission.ft_id.is_empty(), "ft_id must not be empty");
        debug_assert!(!submission.user.is_empty(), "user must not be empty");

        let now = Utc::now();
        let mut record = submission.clone();
        if record.id.is_none() {
            record.id = Some(uuid::Uuid::new_v4().to_string());
        }
        if record.date_inserted.is_none() {
            record.date_inserted = Some(now);
        }
        record.date_modified = Some(now);

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SUBMISSIONS)?;
            let data = rmp_serde::to_vec_named(&record)?;
            table.insert(
                (record.ft_id.as_str(), record.user.as_str()),
                data.as_slice(),
            )?;
        }
        write_txn.commit()?;
        Ok(record)
    }

    /// Get the submission a user made for an ft_id
    pub fn get_submission(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<Option<Submission>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBMISSIONS)?;

        match table.get((ft_id, user))? {
            Some(data) => {
                let submission: Submission = rmp_serde::from_slice(data.value())?;
                Ok(Some(submission))
            }
            None => Ok(None),
        }
    }

    /// Get the submissions of every user for an ft_id
    pub fn get_submissions_by_ft_id(&self, ft_id: &str) -> Result<Vec<Submission>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBMISSIONS)?;

        let mut submissions = Vec::new();
        for result in table.range((ft_id, "")..)? {
            let (key, value) = result?;
            if key.value().0 != ft_id {
                break;
            }
            let submission: Submission = rmp_serde::from_slice(value.value())?;
            submissions.push(submission);
        }

        Ok(submissions)
    }

    /// Delete a submission together with the annotations produced for it.
    ///
    /// With `transactional` both tables change in a single write transaction;
    /// otherwise the submission is committed first and the annotations after.
    /// Returns whether a submission existed.
    pub fn delete_submission(
        &self,
        ft_id: &str,
        user: &str,
        transactional: bool,
    ) -> Result<bool, DatabaseError> {
        if transactional {
            let write_txn = self.begin_write()?;
            let deleted = remove_submission(&write_txn, ft_id, user)?;
            remove_annotations(&write_txn, ft_id, user)?;
            write_txn.commit()?;
            return Ok(deleted);
        }

        let write_txn = self.begin_write()?;
        let deleted = remove_submission(&write_txn, ft_id, user)?;
        write_txn.commit()?;

        let write_txn = self.begin_write()?;
        remove_annotations(&write_txn, ft_id, user)?;
        write_txn.commit()?;

        Ok(deleted)
    }
}

fn remove_submission(
    write_txn: &WriteTransaction,
    ft_id: &str,
    user: &str,
) -> Result<bool, DatabaseError> {
    let mut table = write_txn.open_table(SUBMISSIONS)?;
    let removed = table.remove((ft_id, user))?.is_some();
    Ok(removed)
}

fn remove_annotations(
    write_txn: &WriteTransaction,
    ft_id: &str,
    user: &str,
) -> Result<u64, DatabaseError> {
    let mut table = write_txn.open_table(ANNOTATIONS)?;

    let filenames: Vec<String> = {
        let mut filenames = Vec::new();
        for result in table.range((ft_id, user, "")..)? {
            let (key, _) = result?;
            let (key_ft_id, key_user, filename) = key.value();
            if key_ft_id != ft_id || key_user != user {
                break;
            }
            filenames.push(filename.to_string());
        }
        filenames
    };

    for filename in &filenames {
        table.remove((ft_id, user, filename.as_str()))?;
    }

    Ok(filenames.len() as u64)
}
