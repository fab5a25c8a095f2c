use redb::TableDefinition;

/// Submissions: (ft_id, user) -> SubmissionRecord (msgpack)
pub const SUBMISSIONS: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("submissions");

/// Annotations produced by the text-mining worker: (ft_id, user, filename) -> AnnotationsRecord (msgpack)
pub const ANNOTATIONS: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("annotations");

/// API users: username -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Local queue outbox: (queue, sequence) -> OutboxMessage (msgpack)
pub const QUEUE_OUTBOX: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("queue_outbox");
