//! Local filesystem storage backend.
//!
//! Files are streamed into one directory per user and recorded with their
//! absolute path as the locator.

mod storage;

pub use storage::LocalStorage;
