//! In-memory metadata store (for tests and dry runs)

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::metadata::{FileRecord, FolderDescriptor, FolderId, MetadataStore, NewFileRecord, UserId};
use crate::mode::StorageMode;

#[derive(Debug, Clone)]
struct Folder {
    descriptor: FolderDescriptor,
    user_id: UserId,
}

#[derive(Debug, Default)]
struct Inner {
    folders: HashMap<FolderId, Folder>,
    files: HashMap<i64, FileRecord>,
    next_folder_id: FolderId,
}

/// In-memory folder tree and file records.
///
/// Not persistent: data is lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    inner: RwLock<Inner>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root folder of a user, or return the existing one.
    pub async fn ensure_root(&self, user_id: UserId) -> FolderId {
        let mut inner = self.inner.write().await;
        if let Some(root) = inner
            .folders
            .values()
            .find(|f| f.user_id == user_id && f.descriptor.parent_id.is_none())
        {
            return root.descriptor.id;
        }
        Self::insert_folder(&mut inner, user_id, None, "/")
    }

    /// Create a folder under `parent_id`.
    pub async fn create_folder(
        &self,
        user_id: UserId,
        parent_id: FolderId,
        name: &str,
    ) -> Result<FolderId, StorageError> {
        let mut inner = self.inner.write().await;
        match inner.folders.get(&parent_id) {
            Some(parent) if parent.user_id == user_id => {}
            _ => return Err(StorageError::NotFound(format!("folder {}", parent_id))),
        }
        Ok(Self::insert_folder(&mut inner, user_id, Some(parent_id), name))
    }

    pub async fn rename_folder(&self, folder_id: FolderId, name: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let folder = inner
            .folders
            .get_mut(&folder_id)
            .ok_or_else(|| StorageError::NotFound(format!("folder {}", folder_id)))?;
        folder.descriptor.name = name.to_string();
        Ok(())
    }

    pub async fn file(&self, message_id: i64) -> Option<FileRecord> {
        self.inner.read().await.files.get(&message_id).cloned()
    }

    pub async fn files_in_folder(&self, folder_id: FolderId, user_id: UserId) -> Vec<FileRecord> {
        let inner = self.inner.read().await;
        let mut files: Vec<FileRecord> = inner
            .files
            .values()
            .filter(|f| f.folder_id == folder_id && f.user_id == user_id)
            .cloned()
            .collect();
        files.sort_by_key(|f| f.message_id);
        files
    }

    pub async fn file_count(&self) -> usize {
        self.inner.read().await.files.len()
    }

    fn insert_folder(
        inner: &mut Inner,
        user_id: UserId,
        parent_id: Option<FolderId>,
        name: &str,
    ) -> FolderId {
        inner.next_folder_id += 1;
        let id = inner.next_folder_id;
        inner.folders.insert(
            id,
            Folder {
                descriptor: FolderDescriptor {
                    id,
                    name: name.to_string(),
                    parent_id,
                },
                user_id,
            },
        );
        id
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn add_file(
        &self,
        record: NewFileRecord,
        folder_id: FolderId,
        user_id: UserId,
        storage_type: StorageMode,
    ) -> Result<i64, StorageError> {
        let mut inner = self.inner.write().await;
        if inner.files.contains_key(&record.message_id) {
            return Err(StorageError::Metadata(format!(
                "duplicate message_id {}",
                record.message_id
            )));
        }
        let id = record.message_id;
        inner.files.insert(
            id,
            FileRecord::from_new(record, folder_id, user_id, storage_type),
        );
        Ok(id)
    }

    async fn delete_files_by_ids(&self, ids: &[i64], user_id: UserId) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner
            .files
            .retain(|id, file| !(file.user_id == user_id && ids.contains(id)));
        Ok(())
    }

    async fn folder_path(
        &self,
        folder_id: FolderId,
        user_id: UserId,
    ) -> Result<Vec<FolderDescriptor>, StorageError> {
        let inner = self.inner.read().await;
        let mut chain = Vec::new();
        let mut current = Some(folder_id);
        while let Some(id) = current {
            let folder = inner
                .folders
                .get(&id)
                .filter(|f| f.user_id == user_id)
                .ok_or_else(|| StorageError::NotFound(format!("folder {}", id)))?;
            chain.push(folder.descriptor.clone());
            current = folder.descriptor.parent_id;
        }
        chain.reverse();
        Ok(chain)
    }

    async fn root_folder(&self, user_id: UserId) -> Result<Option<FolderDescriptor>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .folders
            .values()
            .find(|f| f.user_id == user_id && f.descriptor.parent_id.is_none())
            .map(|f| f.descriptor.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(message_id: i64) -> NewFileRecord {
        NewFileRecord {
            message_id,
            file_name: "a.txt".to_string(),
            mimetype: "text/plain".to_string(),
            size: Some(1),
            file_id: "/tmp/a.txt".to_string(),
            date: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_folder_path_root_to_target() {
        let store = InMemoryMetadataStore::new();
        let root = store.ensure_root(7).await;
        let parent = store.create_folder(7, root, "Parent").await.unwrap();
        let child = store.create_folder(7, parent, "Child").await.unwrap();

        let names: Vec<String> = store
            .folder_path(child, 7)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["/", "Parent", "Child"]);
        assert_eq!(store.root_folder(7).await.unwrap().unwrap().id, root);
        assert_eq!(store.ensure_root(7).await, root);
    }

    #[tokio::test]
    async fn test_folder_path_other_user() {
        let store = InMemoryMetadataStore::new();
        let root = store.ensure_root(1).await;
        let result = store.folder_path(root, 2).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(store.root_folder(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_and_delete_scoped_to_user() {
        let store = InMemoryMetadataStore::new();
        store.add_file(record(1), 1, 10, StorageMode::Local).await.unwrap();
        store.add_file(record(2), 1, 20, StorageMode::Local).await.unwrap();
        assert!(store
            .add_file(record(1), 1, 10, StorageMode::Local)
            .await
            .is_err());

        store.delete_files_by_ids(&[1, 2], 10).await.unwrap();
        assert!(store.file(1).await.is_none());
        assert!(store.file(2).await.is_some());
    }
}
