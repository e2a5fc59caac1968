use thiserror::Error;

use crate::metadata::UserId;
use crate::mode::StorageMode;

/// Errors surfaced by storage backends and the router.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote storage error: {0}")]
    Remote(String),

    #[error("Remote server rejected write of {path} (status {status})")]
    WriteRejected { path: String, status: u16 },

    #[error("No WebDAV profile configured for user {0}")]
    MissingWebDavProfile(UserId),

    #[error("Root folder not found for user {0}")]
    RootFolderMissing(UserId),

    #[error("Metadata store error: {0}")]
    Metadata(String),

    #[error("Storage backend '{0}' is not available")]
    BackendUnavailable(StorageMode),

    #[error("Invalid storage mode: {0}")]
    InvalidMode(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
