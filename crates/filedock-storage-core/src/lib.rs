//! Core traits and types for filedock storage backends.
//!
//! This crate defines the abstractions shared between the storage implementations:
//! - `StorageBackend`: upload, remove, stream and direct-link operations
//! - `MetadataStore`: the external file/folder metadata store the backends register records in
//! - `FileIdGenerator`: unique numeric identifiers for stored files
//! - `StorageMode` and `WebDavProfile`: the values selected and persisted by the router

mod backend;
mod error;
mod id;
mod memory;
mod metadata;
mod mode;

pub use backend::{ByteReader, RemoveReport, StorageBackend, UploadOutcome, UploadRequest};
pub use error::StorageError;
pub use id::FileIdGenerator;
pub use memory::InMemoryMetadataStore;
pub use metadata::{FileRecord, FolderDescriptor, FolderId, MetadataStore, NewFileRecord, UserId};
pub use mode::{StorageMode, WebDavProfile};
