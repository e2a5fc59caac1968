//! Persisted storage configuration (`data/config.json`).
//!
//! ```json
//! {
//!   "storageMode": "webdav",
//!   "webdav": [
//!     { "userId": 42, "url": "https://dav.example.com", "username": "me", "password": "..." }
//!   ]
//! }
//! ```
//! Unknown top-level keys are carried through a read/write cycle untouched.

use std::io;
use std::path::{Path, PathBuf};

use filedock_storage_core::{StorageMode, UserId, WebDavProfile};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

/// Persisted configuration.
///
/// Each field is parsed on its own: an unrecognised `storageMode` falls back
/// to the default mode, and a malformed `webdav` entry is kept aside verbatim
/// so that writing the config back never loses it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConfig", into = "RawConfig")]
pub struct Config {
    pub storage_mode: StorageMode,
    pub webdav_profiles: Vec<WebDavProfile>,
    /// Entries of `webdav` that are not valid profiles
    pub unparsed_profiles: Vec<Value>,
    pub extra: Map<String, Value>,
}

impl Config {
    pub fn profile_for(&self, user_id: UserId) -> Option<&WebDavProfile> {
        self.webdav_profiles.iter().find(|p| p.user_id == user_id)
    }

    /// Insert or replace the profile of `profile.user_id`. Position is kept on replace.
    pub fn upsert_profile(&mut self, profile: WebDavProfile) {
        self.remove_unparsed(profile.user_id);
        match self
            .webdav_profiles
            .iter_mut()
            .find(|p| p.user_id == profile.user_id)
        {
            Some(existing) => *existing = profile,
            None => self.webdav_profiles.push(profile),
        }
    }

    /// Returns whether a profile was removed.
    pub fn remove_profile(&mut self, user_id: UserId) -> bool {
        let before = self.webdav_profiles.len();
        self.webdav_profiles.retain(|p| p.user_id != user_id);
        let removed_unparsed = self.remove_unparsed(user_id);
        self.webdav_profiles.len() != before || removed_unparsed
    }

    fn remove_unparsed(&mut self, user_id: UserId) -> bool {
        let before = self.unparsed_profiles.len();
        self.unparsed_profiles
            .retain(|entry| entry.get("userId").and_then(Value::as_i64) != Some(user_id));
        self.unparsed_profiles.len() != before
    }
}

/// On-disk shape of [`Config`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(rename = "storageMode", default, skip_serializing_if = "Option::is_none")]
    storage_mode: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    webdav: Option<Value>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let (webdav_profiles, unparsed_profiles) = parse_profiles(raw.webdav);
        Self {
            storage_mode: parse_mode(raw.storage_mode),
            webdav_profiles,
            unparsed_profiles,
            extra: raw.extra,
        }
    }
}

impl From<Config> for RawConfig {
    fn from(config: Config) -> Self {
        let mut webdav: Vec<Value> = config
            .webdav_profiles
            .into_iter()
            .filter_map(|profile| serde_json::to_value(profile).ok())
            .collect();
        webdav.extend(config.unparsed_profiles);
        Self {
            storage_mode: Some(Value::from(config.storage_mode.as_str())),
            webdav: Some(Value::Array(webdav)),
            extra: config.extra,
        }
    }
}

fn parse_mode(raw: Option<Value>) -> StorageMode {
    match raw {
        None | Some(Value::Null) => StorageMode::default(),
        Some(Value::String(value)) => value.parse().unwrap_or_else(|_| {
            warn!(
                "Unknown storage mode '{}' in config, using {}",
                value,
                StorageMode::default()
            );
            StorageMode::default()
        }),
        Some(other) => {
            warn!(
                "Storage mode in config is not a string ({}), using {}",
                other,
                StorageMode::default()
            );
            StorageMode::default()
        }
    }
}

fn parse_profiles(raw: Option<Value>) -> (Vec<WebDavProfile>, Vec<Value>) {
    let entries = match raw {
        None | Some(Value::Null) => return (Vec::new(), Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            warn!("WebDAV profiles in config are not a list, keeping {} aside", other);
            vec![other]
        }
    };

    let mut profiles = Vec::with_capacity(entries.len());
    let mut unparsed = Vec::new();
    for entry in entries {
        match WebDavProfile::deserialize(&entry) {
            Ok(profile) => profiles.push(profile),
            Err(e) => {
                warn!("Skipping malformed WebDAV profile in config: {}", e);
                unparsed.push(entry);
            }
        }
    }
    (profiles, unparsed)
}

/// JSON file holding the active storage mode and the WebDAV profiles.
///
/// The file is read on every call; nothing is cached here.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config. Any failure yields the default config.
    pub async fn read(&self) -> Config {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.path.display());
                return Config::default();
            }
            Err(e) => {
                error!("Failed to read config {}: {}", self.path.display(), e);
                return Config::default();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to parse config {}: {}", self.path.display(), e);
                Config::default()
            }
        }
    }

    /// Persist `config` as pretty JSON. Returns `false` on failure.
    pub async fn write(&self, config: &Config) -> bool {
        match self.try_write(config).await {
            Ok(()) => {
                debug!("Wrote config {}", self.path.display());
                true
            }
            Err(e) => {
                error!("Failed to write config {}: {}", self.path.display(), e);
                false
            }
        }
    }

    async fn try_write(&self, config: &Config) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await
    }

    /// Switch the persisted storage mode. Unrecognised modes leave the file alone.
    pub async fn set_mode(&self, mode: &str) -> bool {
        let mode: StorageMode = match mode.parse() {
            Ok(mode) => mode,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };

        let mut config = self.read().await;
        config.storage_mode = mode;
        if !self.write(&config).await {
            return false;
        }
        info!("Storage mode set to {}", mode);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("data").join("config.json"))
    }

    fn profile(user_id: UserId, username: &str) -> WebDavProfile {
        WebDavProfile {
            user_id,
            url: "https://dav.example.com".to_string(),
            username: username.to_string(),
            password: "pw".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_reads_default() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let config = store.read().await;
        assert_eq!(config.storage_mode, StorageMode::Telegram);
        assert!(config.webdav_profiles.is_empty());
        // Reading never creates the file
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_malformed_file_reads_default() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.read().await, Config::default());
    }

    #[tokio::test]
    async fn test_legacy_config_backfills_webdav() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"{"storageMode":"local","botName":"docs-bot"}"#,
        )
        .unwrap();

        let config = store.read().await;
        assert_eq!(config.storage_mode, StorageMode::Local);
        assert!(config.webdav_profiles.is_empty());
        assert_eq!(config.extra.get("botName"), Some(&Value::from("docs-bot")));

        // Round trip keeps the unrelated key
        assert!(store.write(&config).await);
        let raw: Value = serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw["botName"], "docs-bot");
        assert_eq!(raw["webdav"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_null_webdav_and_unknown_mode() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{"storageMode":"ftp","webdav":null}"#).unwrap();

        let config = store.read().await;
        assert_eq!(config.storage_mode, StorageMode::Telegram);
        assert!(config.webdav_profiles.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_profile_does_not_drop_others() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"{"storageMode":"local","webdav":[
                {"userId":1,"url":"https://dav.example.com","username":"a","password":"pw"},
                {"userId":2,"url":"https://b","username":"b"}
            ]}"#,
        )
        .unwrap();

        let config = store.read().await;
        assert_eq!(config.storage_mode, StorageMode::Local);
        assert_eq!(config.webdav_profiles, vec![profile(1, "a")]);
        assert_eq!(config.unparsed_profiles.len(), 1);

        // Switching mode keeps both the valid and the malformed entry on disk
        assert!(store.set_mode("webdav").await);
        let raw: Value = serde_json::from_slice(&std::fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(raw["storageMode"], "webdav");
        let entries = raw["webdav"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["username"], "a");
        assert_eq!(entries[1]["userId"], 2);
        assert!(entries[1].get("password").is_none());
    }

    #[tokio::test]
    async fn test_non_string_mode_keeps_profiles() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"{"storageMode":3,"webdav":[
                {"userId":1,"url":"https://dav.example.com","username":"a","password":"pw"}
            ]}"#,
        )
        .unwrap();

        let config = store.read().await;
        assert_eq!(config.storage_mode, StorageMode::Telegram);
        assert_eq!(config.webdav_profiles, vec![profile(1, "a")]);
    }

    #[test]
    fn test_upsert_replaces_malformed_entry() {
        let mut config: Config = serde_json::from_str(
            r#"{"webdav":[{"userId":2,"url":"https://b","username":"b"}]}"#,
        )
        .unwrap();
        assert!(config.webdav_profiles.is_empty());

        config.upsert_profile(profile(2, "b"));
        assert!(config.unparsed_profiles.is_empty());
        assert_eq!(config.webdav_profiles, vec![profile(2, "b")]);

        let mut config: Config = serde_json::from_str(
            r#"{"webdav":[{"userId":3,"username":"c"}]}"#,
        )
        .unwrap();
        assert!(config.remove_profile(3));
        assert!(config.unparsed_profiles.is_empty());
    }

    #[tokio::test]
    async fn test_write_uses_wire_names() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut config = Config {
            storage_mode: StorageMode::Webdav,
            ..Default::default()
        };
        config.upsert_profile(profile(42, "me"));

        assert!(store.write(&config).await);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains('\n'), "expected pretty JSON");
        let raw: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(raw["storageMode"], "webdav");
        assert_eq!(raw["webdav"][0]["userId"], 42);
        assert_eq!(raw["webdav"][0]["username"], "me");
        assert_eq!(store.read().await, config);
    }

    #[tokio::test]
    async fn test_set_mode() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(store.set_mode("local").await);
        assert_eq!(store.read().await.storage_mode, StorageMode::Local);

        let before = std::fs::read(store.path()).unwrap();
        assert!(!store.set_mode("ftp").await);
        assert!(!store.set_mode("Local").await);
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_set_mode_keeps_profiles() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut config = Config::default();
        config.upsert_profile(profile(1, "a"));
        assert!(store.write(&config).await);

        assert!(store.set_mode("webdav").await);

        let config = store.read().await;
        assert_eq!(config.storage_mode, StorageMode::Webdav);
        assert_eq!(config.webdav_profiles, vec![profile(1, "a")]);
    }

    #[tokio::test]
    async fn test_write_failure_returns_false() {
        let dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("data");
        std::fs::write(&blocker, "").unwrap();
        let store = ConfigStore::new(blocker.join("config.json"));

        assert!(!store.write(&Config::default()).await);
    }

    #[test]
    fn test_upsert_and_remove_profile() {
        let mut config = Config::default();
        config.upsert_profile(profile(1, "a"));
        config.upsert_profile(profile(2, "b"));
        config.upsert_profile(profile(1, "a2"));

        assert_eq!(config.webdav_profiles.len(), 2);
        assert_eq!(config.webdav_profiles[0].username, "a2");
        assert_eq!(config.profile_for(2).map(|p| p.username.as_str()), Some("b"));

        assert!(config.remove_profile(1));
        assert!(!config.remove_profile(1));
        assert!(config.profile_for(1).is_none());
    }
}
