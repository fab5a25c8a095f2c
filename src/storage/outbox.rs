use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{OutboxMessage, TextMiningMessage};
use super::tables::*;

impl Database {
    // ========================================================================
    // Queue outbox operations
    // ========================================================================

    /// Append a message to the named queue. Returns its sequence number,
    /// which starts at 1 and increases per queue.
    pub fn append_message(
        &self,
        queue: &str,
        exchange: &str,
        message: &TextMiningMessage,
    ) -> Result<u64, DatabaseError> {
        let write_txn = self.begin_write()?;
        let sequence = {
            let mut table = write_txn.open_table(QUEUE_OUTBOX)?;
            let last = table
                .range((queue, 0u64)..=(queue, u64::MAX))?
                .next_back()
                .transpose()?
                .map(|(key, _)| key.value().1);
            let sequence = last.map_or(1, |s| s + 1);

            let entry = OutboxMessage {
                sequence,
                exchange: exchange.to_string(),
                message: message.clone(),
                enqueued_at: Utc::now(),
            };
            let data = rmp_serde::to_vec_named(&entry)?;
            table.insert((queue, sequence), data.as_slice())?;
            sequence
        };
        write_txn.commit()?;
        Ok(sequence)
    }

    /// Messages waiting in the named queue, oldest first
    pub fn pending_messages(&self, queue: &str) -> Result<Vec<OutboxMessage>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(QUEUE_OUTBOX)?;

        let mut messages = Vec::new();
        for result in table.range((queue, 0u64)..=(queue, u64::MAX))? {
            let (_, value) = result?;
            messages.push(rmp_serde::from_slice(value.value())?);
        }

        Ok(messages)
    }
}
