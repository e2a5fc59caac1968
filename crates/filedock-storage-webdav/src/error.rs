use filedock_storage_core::StorageError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the WebDAV protocol client.
#[derive(Debug, Error)]
pub enum WebDavError {
    #[error("WebDAV request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("WebDAV {method} {path} returned {status}")]
    Status {
        method: String,
        path: String,
        status: StatusCode,
    },

    #[error("Invalid WebDAV response: {0}")]
    InvalidResponse(String),

    #[error("Invalid WebDAV URL: {0}")]
    InvalidUrl(String),
}

impl WebDavError {
    /// HTTP status of a protocol-level failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// MKCOL on a collection that already exists.
    ///
    /// RFC 4918 answers 405; some servers answer 501 instead.
    pub fn is_collection_exists(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::METHOD_NOT_ALLOWED) | Some(StatusCode::NOT_IMPLEMENTED)
        )
    }

    /// The target resource does not exist (404).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

impl From<WebDavError> for StorageError {
    fn from(err: WebDavError) -> Self {
        if err.is_not_found() {
            if let WebDavError::Status { path, .. } = &err {
                return StorageError::NotFound(path.clone());
            }
        }
        StorageError::Remote(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: StatusCode) -> WebDavError {
        WebDavError::Status {
            method: "MKCOL".to_string(),
            path: "/Docs".to_string(),
            status,
        }
    }

    #[test]
    fn test_classification() {
        assert!(status_error(StatusCode::METHOD_NOT_ALLOWED).is_collection_exists());
        assert!(status_error(StatusCode::NOT_IMPLEMENTED).is_collection_exists());
        assert!(!status_error(StatusCode::CONFLICT).is_collection_exists());
        assert!(!status_error(StatusCode::FORBIDDEN).is_collection_exists());

        assert!(status_error(StatusCode::NOT_FOUND).is_not_found());
        assert!(!status_error(StatusCode::GONE).is_not_found());
        assert!(!WebDavError::InvalidResponse("x".to_string()).is_not_found());
    }

    #[test]
    fn test_into_storage_error() {
        let err: StorageError = status_error(StatusCode::NOT_FOUND).into();
        assert!(matches!(err, StorageError::NotFound(ref p) if p == "/Docs"));

        let err: StorageError = status_error(StatusCode::UNAUTHORIZED).into();
        assert!(matches!(err, StorageError::Remote(ref m) if m.contains("401")));
    }
}
