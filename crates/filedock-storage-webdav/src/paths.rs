//! Folder tree to remote path mapping.

use filedock_storage_core::{FolderId, MetadataStore, StorageError, UserId};

/// Resolve the remote path of a folder from the metadata store's tree.
///
/// The user's root folder maps to `/`. Any other folder maps to the names of
/// its ancestors below the root, e.g. `/Documents/Invoices`. Folder names can
/// change between calls, so the result must not be cached.
pub async fn resolve_folder_path(
    metadata: &dyn MetadataStore,
    folder_id: FolderId,
    user_id: UserId,
) -> Result<String, StorageError> {
    let root = metadata
        .root_folder(user_id)
        .await?
        .ok_or(StorageError::RootFolderMissing(user_id))?;

    if folder_id == root.id {
        return Ok("/".to_string());
    }

    let chain = metadata.folder_path(folder_id, user_id).await?;
    let names: Vec<&str> = chain.iter().skip(1).map(|f| f.name.as_str()).collect();
    Ok(format!("/{}", names.join("/")))
}

/// Remote path of a file inside a folder, without a doubled slash for the root.
pub fn remote_file_path(folder_path: &str, file_name: &str) -> String {
    let prefix = folder_path.trim_end_matches('/');
    format!("{}/{}", prefix, file_name)
}

/// Every collection from the top down to `path`: `/a/b` gives `["/a", "/a/b"]`.
pub fn collection_chain(path: &str) -> Vec<String> {
    let mut current = String::new();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            current.push('/');
            current.push_str(segment);
            current.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use filedock_storage_core::InMemoryMetadataStore;

    #[tokio::test]
    async fn test_root_resolves_to_slash() {
        let store = InMemoryMetadataStore::new();
        let root = store.ensure_root(1).await;
        assert_eq!(resolve_folder_path(&store, root, 1).await.unwrap(), "/");
    }

    #[tokio::test]
    async fn test_child_and_nested_folders() {
        let store = InMemoryMetadataStore::new();
        let root = store.ensure_root(1).await;
        let invoices = store.create_folder(1, root, "Invoices").await.unwrap();
        let parent = store.create_folder(1, root, "Parent").await.unwrap();
        let child = store.create_folder(1, parent, "Child").await.unwrap();

        assert_eq!(
            resolve_folder_path(&store, invoices, 1).await.unwrap(),
            "/Invoices"
        );
        assert_eq!(
            resolve_folder_path(&store, child, 1).await.unwrap(),
            "/Parent/Child"
        );
    }

    #[tokio::test]
    async fn test_rename_is_picked_up() {
        let store = InMemoryMetadataStore::new();
        let root = store.ensure_root(1).await;
        let folder = store.create_folder(1, root, "Drafts").await.unwrap();
        assert_eq!(resolve_folder_path(&store, folder, 1).await.unwrap(), "/Drafts");

        store.rename_folder(folder, "Final").await.unwrap();
        assert_eq!(resolve_folder_path(&store, folder, 1).await.unwrap(), "/Final");
    }

    #[tokio::test]
    async fn test_missing_root() {
        let store = InMemoryMetadataStore::new();
        let result = resolve_folder_path(&store, 1, 99).await;
        assert!(matches!(result, Err(StorageError::RootFolderMissing(99))));
    }

    #[test]
    fn test_remote_file_path() {
        assert_eq!(remote_file_path("/", "a.txt"), "/a.txt");
        assert_eq!(remote_file_path("/Invoices", "a.txt"), "/Invoices/a.txt");
        assert_eq!(remote_file_path("/Parent/Child", "a.txt"), "/Parent/Child/a.txt");
    }

    #[test]
    fn test_collection_chain() {
        assert_eq!(collection_chain("/a/b/c"), vec!["/a", "/a/b", "/a/b/c"]);
        assert_eq!(collection_chain("/Invoices"), vec!["/Invoices"]);
        assert!(collection_chain("/").is_empty());
    }
}
