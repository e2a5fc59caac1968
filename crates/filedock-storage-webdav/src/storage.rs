use std::sync::Arc;

use async_trait::async_trait;
use filedock_storage_core::{
    ByteReader, FileIdGenerator, FileRecord, MetadataStore, NewFileRecord, RemoveReport,
    StorageBackend, StorageError, StorageMode, UploadOutcome, UploadRequest, UserId,
    WebDavProfile,
};
use tokio::io::AsyncReadExt;
use tracing::{debug, instrument, warn};

use crate::cache::ClientCache;
use crate::client::WebDavClient;
use crate::error::WebDavError;
use crate::paths::{remote_file_path, resolve_folder_path};

/// WebDAV storage backend.
///
/// Each user stores files on their own WebDAV endpoint. The user's folder tree
/// in the metadata store is mirrored as remote collections:
/// ```text
/// {profile.url}/
///   {file}                      # files in the root folder
///   {Folder}/{Subfolder}/{file} # files in nested folders
/// ```
/// The remote path is stored as the record's `file_id`.
pub struct WebDavStorage {
    profiles: Vec<WebDavProfile>,
    clients: Arc<ClientCache>,
    metadata: Arc<dyn MetadataStore>,
    ids: Arc<FileIdGenerator>,
}

impl WebDavStorage {
    /// `profiles` is the configured profile list at the time the backend is selected.
    pub fn new(
        profiles: Vec<WebDavProfile>,
        clients: Arc<ClientCache>,
        metadata: Arc<dyn MetadataStore>,
        ids: Arc<FileIdGenerator>,
    ) -> Self {
        Self {
            profiles,
            clients,
            metadata,
            ids,
        }
    }

    /// Cached client for the user's profile. No profile, no fallback.
    pub fn client_for(&self, user_id: UserId) -> Result<Arc<WebDavClient>, StorageError> {
        let profile = self
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .ok_or(StorageError::MissingWebDavProfile(user_id))?;
        Ok(self.clients.get_or_connect(profile)?)
    }
}

#[async_trait]
impl StorageBackend for WebDavStorage {
    fn kind(&self) -> StorageMode {
        StorageMode::Webdav
    }

    #[instrument(
        skip(self, request),
        level = "debug",
        fields(user_id = request.user_id, file_name = %request.file_name)
    )]
    async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, StorageError> {
        let UploadRequest {
            mut content,
            file_name,
            mimetype,
            user_id,
            folder_id,
            size: _,
        } = request;

        let client = self.client_for(user_id)?;
        let folder_path = resolve_folder_path(self.metadata.as_ref(), folder_id, user_id).await?;
        let remote_path = remote_file_path(&folder_path, &file_name);

        if folder_path != "/" {
            match client.create_directory(&folder_path, true).await {
                Ok(()) => {}
                Err(e) if e.is_collection_exists() => {
                    debug!("Remote folder {} already exists", folder_path);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut buffer = Vec::new();
        content.read_to_end(&mut buffer).await?;

        match client
            .put_file_contents(&remote_path, buffer, &mimetype, true)
            .await
        {
            Ok(()) => {}
            Err(WebDavError::Status { status, .. }) => {
                return Err(StorageError::WriteRejected {
                    path: remote_path,
                    status: status.as_u16(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        // The server is the source of truth for size and modification time
        let stat = client.stat(&remote_path).await?;
        let message_id = self.ids.next_id();

        let record = NewFileRecord {
            message_id,
            file_name,
            mimetype,
            size: Some(stat.size),
            file_id: remote_path.clone(),
            date: stat.last_modified,
        };
        let file_id = self
            .metadata
            .add_file(record, folder_id, user_id, StorageMode::Webdav)
            .await?;

        debug!("Uploaded {} ({} bytes)", remote_path, stat.size);
        Ok(UploadOutcome {
            message: "File uploaded to WebDAV.".to_string(),
            file_id,
        })
    }

    #[instrument(skip(self, files), level = "debug", fields(count = files.len()))]
    async fn remove(
        &self,
        files: &[FileRecord],
        user_id: UserId,
    ) -> Result<RemoveReport, StorageError> {
        let client = self.client_for(user_id)?;
        let mut storage_failures = 0;

        for file in files {
            match client.delete_file(&file.file_id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!("Remote file already deleted: {}", file.file_id);
                }
                Err(e) => {
                    warn!("Failed to delete WebDAV file {}: {}", file.file_id, e);
                    storage_failures += 1;
                }
            }
        }

        let ids: Vec<i64> = files.iter().map(|f| f.message_id).collect();
        self.metadata.delete_files_by_ids(&ids, user_id).await?;

        Ok(RemoveReport {
            records_deleted: ids.len(),
            storage_failures,
        })
    }

    #[instrument(skip(self), level = "debug")]
    async fn stream(&self, file_id: &str, user_id: UserId) -> Result<ByteReader, StorageError> {
        let client = self.client_for(user_id)?;
        Ok(client.read_stream(file_id).await?)
    }

    async fn download_url(
        &self,
        file_id: &str,
        user_id: UserId,
    ) -> Result<Option<String>, StorageError> {
        let client = self.client_for(user_id)?;
        Ok(Some(client.download_link(file_id)?))
    }
}
