use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file record stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    /// Object store key, always `files/{id}/{name}`
    pub storage_key: String,
    pub byte_size: u64,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(id: String, name: String, byte_size: u64) -> Self {
        let storage_key = storage_key(&id, &name);
        Self {
            id,
            name,
            storage_key,
            byte_size,
            created_at: Utc::now(),
        }
    }
}

/// Object store key for a file.
pub fn storage_key(id: &str, name: &str) -> String {
    format!("files/{id}/{name}")
}

/// Extract the file id from a storage key (`files/{id}/{name}` -> `id`).
///
/// Returns `None` when the key has fewer than two `/`-separated segments or the
/// id segment is empty.
pub fn file_id_from_key(key: &str) -> Option<&str> {
    key.split('/').nth(1).filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Completed,
}

/// Outcome of processing one file. At most one row exists per file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub id: String,
    pub file_id: String,
    pub status: ProcessingStatus,
    pub result: String,
    pub created_at: DateTime<Utc>,
}

impl ProcessingResult {
    pub fn completed(file_id: &str, result: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_id: file_id.to_string(),
            status: ProcessingStatus::Completed,
            result,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    /// Self-describing PBKDF2 hash, never the plaintext
    pub password_hash: String,
    pub email: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A message held by the local queue backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: String,
    pub body: String,
    pub enqueued_at: DateTime<Utc>,
}
