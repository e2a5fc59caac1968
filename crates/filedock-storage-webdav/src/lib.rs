//! WebDAV storage backend.
//!
//! Maps the metadata store's per-user folder tree onto remote paths, keeps one
//! authenticated client per configured endpoint, and tolerates the usual
//! idempotency races (collection already exists, file already deleted).

mod cache;
mod client;
mod error;
mod paths;
mod propfind;
mod storage;

pub use cache::{ClientCache, ClientKey};
pub use client::{RemoteStat, WebDavClient};
pub use error::WebDavError;
pub use paths::{collection_chain, remote_file_path, resolve_folder_path};
pub use storage::WebDavStorage;
