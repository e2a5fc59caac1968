use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::mode::StorageMode;

/// Identifier of an end user (the chat user id of the owning account).
pub type UserId = i64;

/// Identifier of a folder in the metadata store.
pub type FolderId = i64;

/// A file record as handed to the metadata store by a backend after upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFileRecord {
    /// Unique numeric identifier generated by the backend
    pub message_id: i64,
    pub file_name: String,
    pub mimetype: String,
    /// Size in bytes, when known
    pub size: Option<u64>,
    /// Backend-specific locator: absolute path (local) or remote path (WebDAV)
    pub file_id: String,
    pub date: DateTime<Utc>,
}

/// A stored file record, as owned by the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub message_id: i64,
    pub file_name: String,
    pub mimetype: String,
    pub size: Option<u64>,
    pub file_id: String,
    pub date: DateTime<Utc>,
    pub folder_id: FolderId,
    pub user_id: UserId,
    /// Backend that created the record
    pub storage_type: StorageMode,
}

impl FileRecord {
    pub fn from_new(
        record: NewFileRecord,
        folder_id: FolderId,
        user_id: UserId,
        storage_type: StorageMode,
    ) -> Self {
        Self {
            message_id: record.message_id,
            file_name: record.file_name,
            mimetype: record.mimetype,
            size: record.size,
            file_id: record.file_id,
            date: record.date,
            folder_id,
            user_id,
            storage_type,
        }
    }
}

/// A folder in the metadata store's per-user tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDescriptor {
    pub id: FolderId,
    pub name: String,
    /// `None` for the user's root folder
    pub parent_id: Option<FolderId>,
}

/// The external file/folder metadata store.
///
/// Folders form one tree per user; the root is the only folder without a parent.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Register an uploaded file. Returns the id of the stored record.
    async fn add_file(
        &self,
        record: NewFileRecord,
        folder_id: FolderId,
        user_id: UserId,
        storage_type: StorageMode,
    ) -> Result<i64, StorageError>;

    /// Delete file records by their `message_id`, scoped to the owning user.
    async fn delete_files_by_ids(&self, ids: &[i64], user_id: UserId) -> Result<(), StorageError>;

    /// Ancestor chain of a folder, ordered from the user's root to the folder itself.
    async fn folder_path(
        &self,
        folder_id: FolderId,
        user_id: UserId,
    ) -> Result<Vec<FolderDescriptor>, StorageError>;

    /// The user's root folder (the one without a parent), if it exists.
    async fn root_folder(&self, user_id: UserId) -> Result<Option<FolderDescriptor>, StorageError>;
}
