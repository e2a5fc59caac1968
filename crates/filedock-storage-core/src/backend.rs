use std::fmt;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::StorageError;
use crate::metadata::{FileRecord, FolderId, UserId};
use crate::mode::StorageMode;

/// A readable byte source: upload input, or a stored file opened for download.
pub type ByteReader = Box<dyn AsyncRead + Send + Unpin>;

/// Everything a backend needs to store one file.
pub struct UploadRequest {
    pub content: ByteReader,
    pub file_name: String,
    pub mimetype: String,
    pub user_id: UserId,
    pub folder_id: FolderId,
    /// Size announced by the caller; backends may replace it with an authoritative value
    pub size: Option<u64>,
}

impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_name", &self.file_name)
            .field("mimetype", &self.mimetype)
            .field("user_id", &self.user_id)
            .field("folder_id", &self.folder_id)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Human-readable confirmation
    pub message: String,
    /// Id of the record registered in the metadata store
    pub file_id: i64,
}

/// Result of a batch removal.
///
/// Metadata records are always deleted; `storage_failures` counts files whose
/// stored bytes could not be removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveReport {
    pub records_deleted: usize,
    pub storage_failures: usize,
}

/// Capability surface shared by every storage backend.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Tag recorded as `storage_type` on the records this backend creates.
    fn kind(&self) -> StorageMode;

    /// Store the content and register a file record.
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, StorageError>;

    /// Remove stored files, then delete their metadata records.
    async fn remove(&self, files: &[FileRecord], user_id: UserId)
        -> Result<RemoveReport, StorageError>;

    /// Open a stored file for reading. The reader is returned unconsumed.
    async fn stream(&self, file_id: &str, user_id: UserId) -> Result<ByteReader, StorageError>;

    /// Direct download link, for backends that can serve files without proxying.
    async fn download_url(
        &self,
        _file_id: &str,
        _user_id: UserId,
    ) -> Result<Option<String>, StorageError> {
        Ok(None)
    }
}
