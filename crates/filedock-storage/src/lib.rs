//! Storage router for filedock.
//!
//! `StorageService` owns the persisted configuration (`ConfigStore`), the
//! WebDAV client cache and the backends, and hands callers whichever backend
//! the configuration currently selects.

pub mod config;
pub mod service;

pub use config::{Config, ConfigStore};
pub use service::{Backend, StorageService};
