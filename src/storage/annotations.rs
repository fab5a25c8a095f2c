use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::Annotations;
use super::tables::*;

impl Database {
    // ========================================================================
    // Annotations operations
    // ========================================================================

    /// Insert or replace the annotations for one file of a submission.
    /// This is the write-back path of the text-mining worker.
    pub fn put_annotations(&self, annotations: &Annotations) -> Result<(), DatabaseError> {
        let now = Utc::now();
        let mut record = annotations.clone();
        if record.id.is_none() {
            record.id = Some(uuid::Uuid::new_v4().to_string());
        }
        if record.date_inserted.is_none() {
            record.date_inserted = Some(now);
        }
        record.date_modified = Some(now);

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(ANNOTATIONS)?;
            let data = rmp_serde::to_vec_named(&record)?;
            table.insert(
                (
                    record.ft_id.as_str(),
                    record.user.as_str(),
                    record.filename.as_str(),
                ),
                data.as_slice(),
            )?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_annotations(
        &self,
        ft_id: &str,
        user: &str,
        filename: &str,
    ) -> Result<Option<Annotations>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ANNOTATIONS)?;

        match table.get((ft_id, user, filename))? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// All annotations for a user's submission, ordered by filename
    pub fn list_annotations(
        &self,
        ft_id: &str,
        user: &str,
    ) -> Result<Vec<Annotations>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(ANNOTATIONS)?;

        let mut list = Vec::new();
        for result in table.range((ft_id, user, "")..)? {
            let (key, value) = result?;
            let (key_ft_id, key_user, _) = key.value();
            if key_ft_id != ft_id || key_user != user {
                break;
            }
            list.push(rmp_serde::from_slice(value.value())?);
        }

        Ok(list)
    }
}
