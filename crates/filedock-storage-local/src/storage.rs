use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use filedock_storage_core::{
    ByteReader, FileIdGenerator, FileRecord, MetadataStore, NewFileRecord, RemoveReport,
    StorageBackend, StorageError, StorageMode, UploadOutcome, UploadRequest, UserId,
};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

/// Local filesystem storage backend.
///
/// Layout:
/// ```text
/// {root}/
///   {user_id}/
///     {message_id}      # raw file content, no extension
/// ```
/// The absolute path of each file is stored as the record's `file_id`.
pub struct LocalStorage {
    root: PathBuf,
    metadata: Arc<dyn MetadataStore>,
    ids: Arc<FileIdGenerator>,
}

impl LocalStorage {
    pub fn new(
        root: impl AsRef<Path>,
        metadata: Arc<dyn MetadataStore>,
        ids: Arc<FileIdGenerator>,
    ) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            metadata,
            ids,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: UserId) -> PathBuf {
        self.root.join(user_id.to_string())
    }

    /// Best-effort removal of a file left behind by a failed upload.
    async fn discard(path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            warn!("Failed to remove partial upload {}: {}", path.display(), e);
        }
    }

    /// Copy the whole input into `file`. Resolves only once the data is flushed.
    async fn write_content(file: &mut File, content: &mut ByteReader) -> std::io::Result<u64> {
        let written = tokio::io::copy(content, file).await?;
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn kind(&self) -> StorageMode {
        StorageMode::Local
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
            size,
        } = request;

        let user_dir = self.user_dir(user_id);
        fs::create_dir_all(&user_dir).await?;
        let user_dir = fs::canonicalize(&user_dir).await?;

        let message_id = self.ids.next_id();
        let path = user_dir.join(message_id.to_string());

        // create_new: an id collision must never overwrite another file
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let written = match Self::write_content(&mut file, &mut content).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                Self::discard(&path).await;
                return Err(e.into());
            }
        };
        drop(file);

        let record = NewFileRecord {
            message_id,
            file_name,
            mimetype,
            size: size.or(Some(written)),
            file_id: path.to_string_lossy().into_owned(),
            date: chrono::Utc::now(),
        };
        let file_id = match self
            .metadata
            .add_file(record, folder_id, user_id, StorageMode::Local)
            .await
        {
            Ok(file_id) => file_id,
            Err(e) => {
                // No record points at the bytes
                Self::discard(&path).await;
                return Err(e);
            }
        };

        debug!("Stored {} bytes at {}", written, path.display());
        Ok(UploadOutcome {
            message: "File uploaded to local storage.".to_string(),
            file_id,
        })
    }

    #[instrument(skip(self, files), level = "debug", fields(count = files.len()))]
    async fn remove(
        &self,
        files: &[FileRecord],
        user_id: UserId,
    ) -> Result<RemoveReport, StorageError> {
        let mut storage_failures = 0;

        for file in files {
            match fs::remove_file(&file.file_id).await {
                Ok(()) => debug!("Removed {}", file.file_id),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Local file already gone: {}", file.file_id)
                }
                Err(e) => {
                    warn!("Failed to delete local file {}: {}", file.file_id, e);
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
    async fn stream(&self, file_id: &str, _user_id: UserId) -> Result<ByteReader, StorageError> {
        match File::open(file_id).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(file_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
