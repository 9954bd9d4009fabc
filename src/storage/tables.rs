use redb::TableDefinition;

/// File records: file id -> FileRecord (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Processing results: file id -> ProcessingResult (msgpack). One row per file.
pub const PROCESSING_RESULTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("processing_results");

/// User records: user id -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Username index: username -> user id
pub const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// Email index: email -> user id
pub const EMAILS: TableDefinition<&str, &str> = TableDefinition::new("emails");

/// Sessions: token digest -> SessionRecord (msgpack)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Local queue: sequence number -> QueuedMessage (msgpack)
pub const QUEUE_MESSAGES: TableDefinition<u64, &[u8]> = TableDefinition::new("queue_messages");
