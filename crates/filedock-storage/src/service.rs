use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use filedock_storage_core::{
    FileIdGenerator, MetadataStore, StorageBackend, StorageError, StorageMode, UserId,
    WebDavProfile,
};
use filedock_storage_local::LocalStorage;
use filedock_storage_webdav::{ClientCache, WebDavStorage};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::{Config, ConfigStore};

/// The backend selected for one operation.
///
/// Dereferences to the shared `StorageBackend` surface, so callers can
/// `backend.upload(..)` without matching.
pub enum Backend {
    Local(Arc<LocalStorage>),
    WebDav(WebDavStorage),
    Telegram(Arc<dyn StorageBackend>),
}

impl Backend {
    pub fn mode(&self) -> StorageMode {
        match self {
            Self::Local(_) => StorageMode::Local,
            Self::WebDav(_) => StorageMode::Webdav,
            Self::Telegram(_) => StorageMode::Telegram,
        }
    }
}

impl Deref for Backend {
    type Target = dyn StorageBackend;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Local(storage) => &**storage,
            Self::WebDav(storage) => storage,
            Self::Telegram(storage) => &**storage,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Backend").field(&self.mode()).finish()
    }
}

/// Routes storage operations to the backend named by the persisted config.
///
/// Owns the state shared across backend instances: the WebDAV client cache,
/// the file id generator and the last loaded config. The telegram backend
/// lives in the embedding application and is registered with
/// [`StorageService::with_telegram`].
pub struct StorageService {
    store: ConfigStore,
    config: RwLock<Config>,
    local: Arc<LocalStorage>,
    clients: Arc<ClientCache>,
    metadata: Arc<dyn MetadataStore>,
    ids: Arc<FileIdGenerator>,
    telegram: Option<Arc<dyn StorageBackend>>,
}

impl StorageService {
    pub fn new(
        store: ConfigStore,
        uploads_dir: impl AsRef<Path>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        let ids = Arc::new(FileIdGenerator::new());
        let local = Arc::new(LocalStorage::new(
            uploads_dir,
            metadata.clone(),
            ids.clone(),
        ));
        Self {
            store,
            config: RwLock::new(Config::default()),
            local,
            clients: Arc::new(ClientCache::new()),
            metadata,
            ids,
            telegram: None,
        }
    }

    /// Register the backend used when the mode is `telegram`.
    pub fn with_telegram(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.telegram = Some(backend);
        self
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn client_cache(&self) -> &Arc<ClientCache> {
        &self.clients
    }

    /// Config as of the last read or write through this service.
    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Load the config from disk and remember it.
    pub async fn read_config(&self) -> Config {
        let config = self.store.read().await;
        *self.config.write().await = config.clone();
        config
    }

    pub async fn write_config(&self, config: &Config) -> bool {
        if !self.store.write(config).await {
            return false;
        }
        *self.config.write().await = config.clone();
        true
    }

    /// Backend for the currently persisted mode. The config is re-read on every
    /// call so a mode switch takes effect without a restart.
    #[instrument(skip(self), level = "debug")]
    pub async fn current_backend(&self) -> Result<Backend, StorageError> {
        let config = self.read_config().await;
        self.build_backend(config.storage_mode, &config)
    }

    /// Backend for an explicit mode, e.g. the `storage_type` of an existing record.
    #[instrument(skip(self), level = "debug")]
    pub async fn backend_for(&self, mode: StorageMode) -> Result<Backend, StorageError> {
        let config = self.read_config().await;
        self.build_backend(mode, &config)
    }

    fn build_backend(&self, mode: StorageMode, config: &Config) -> Result<Backend, StorageError> {
        let backend = match mode {
            StorageMode::Local => Backend::Local(self.local.clone()),
            StorageMode::Webdav => Backend::WebDav(WebDavStorage::new(
                config.webdav_profiles.clone(),
                self.clients.clone(),
                self.metadata.clone(),
                self.ids.clone(),
            )),
            StorageMode::Telegram => match &self.telegram {
                Some(backend) => Backend::Telegram(backend.clone()),
                None => return Err(StorageError::BackendUnavailable(StorageMode::Telegram)),
            },
        };
        debug!("Selected {} backend", mode);
        Ok(backend)
    }

    /// Persist a new storage mode. Returns `false` for unknown modes or write failures.
    pub async fn set_storage_mode(&self, mode: &str) -> bool {
        if !self.store.set_mode(mode).await {
            return false;
        }
        self.read_config().await;
        true
    }

    /// Add the user's WebDAV profile, replacing any existing one.
    pub async fn upsert_webdav_profile(&self, profile: WebDavProfile) -> bool {
        let user_id = profile.user_id;
        let mut config = self.read_config().await;
        config.upsert_profile(profile);
        let written = self.write_config(&config).await;
        if written {
            info!("Saved WebDAV profile for user {}", user_id);
        }
        written
    }

    /// Returns `false` when the user had no profile or the config could not be written.
    pub async fn remove_webdav_profile(&self, user_id: UserId) -> bool {
        let mut config = self.read_config().await;
        if !config.remove_profile(user_id) {
            debug!("No WebDAV profile to remove for user {}", user_id);
            return false;
        }
        let written = self.write_config(&config).await;
        if written {
            info!("Removed WebDAV profile for user {}", user_id);
        }
        written
    }
}
