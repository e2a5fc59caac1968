use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::metadata::UserId;

/// Storage backends a deployment can route uploads to.
///
/// The same tag is recorded on every file record as its `storage_type`, so a
/// file keeps pointing at the backend that created it after the mode changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    #[default]
    Telegram,
    Webdav,
}

impl StorageMode {
    pub const ALL: [StorageMode; 3] = [Self::Local, Self::Telegram, Self::Webdav];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Telegram => "telegram",
            Self::Webdav => "webdav",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageMode {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| StorageError::InvalidMode(s.to_string()))
    }
}

/// WebDAV credentials configured by one user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDavProfile {
    pub user_id: UserId,
    /// Base URL of the WebDAV endpoint, e.g. `https://dav.example.com/remote.php/dav/files/me`
    pub url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for WebDavProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDavProfile")
            .field("user_id", &self.user_id)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
