//! Process-wide cache of authenticated WebDAV clients.

use std::sync::Arc;

use dashmap::DashMap;
use filedock_storage_core::{UserId, WebDavProfile};
use tracing::{debug, info};

use crate::client::WebDavClient;
use crate::error::WebDavError;

/// Cache key: one client per user and endpoint identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub user_id: UserId,
    pub url: String,
    pub username: String,
}

impl ClientKey {
    pub fn for_profile(profile: &WebDavProfile) -> Self {
        Self {
            user_id: profile.user_id,
            url: profile.url.clone(),
            username: profile.username.clone(),
        }
    }
}

/// Lazily built, never evicted. A profile whose URL or username changed maps
/// to a new key; the old client simply stops being looked up.
#[derive(Default)]
pub struct ClientCache {
    clients: DashMap<ClientKey, Arc<WebDavClient>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached client for the profile, building it on first use.
    pub fn get_or_connect(
        &self,
        profile: &WebDavProfile,
    ) -> Result<Arc<WebDavClient>, WebDavError> {
        let key = ClientKey::for_profile(profile);

        if let Some(cached) = self.clients.get(&key) {
            // Same identity, new password: rebuild below
            if cached.has_password(&profile.password) {
                debug!("WebDAV client cache hit for user {}", profile.user_id);
                return Ok(cached.clone());
            }
        }

        let client = Arc::new(WebDavClient::new(
            &profile.url,
            &profile.username,
            &profile.password,
        )?);
        info!(
            "Created WebDAV client for user {} at {} ({})",
            profile.user_id, profile.url, profile.username
        );
        self.clients.insert(key, client.clone());
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
