//! Object Storage Module
//!
//! The log only needs three primitives from its backing store: a
//! conditional whole-object PUT, a whole-object GET and a prefix LIST.
//! [`ObjectStore`] captures exactly that contract. [`ObjectStoreBackend`]
//! satisfies it on top of the `object_store` crate's in-memory and local
//! filesystem stores, neither of which needs cloud credentials.

mod backend;

pub use backend::ObjectStoreBackend;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{Error, Result};

/// Result type alias for storage collaborator calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by an [`ObjectStore`]
#[derive(Error, Debug)]
pub enum StoreError {
    /// Conditional put found an object already at the key
    #[error("object already exists")]
    AlreadyExists,

    #[error("object not found")]
    NotFound,

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport or service error from the backend
    #[error("backend error: {0}")]
    Backend(String),
}

/// Whole-object storage with conditional writes
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` at `key` only if no object currently exists there.
    ///
    /// Returns [`StoreError::AlreadyExists`] if the key is taken. A
    /// successful call creates exactly one object; a failed one creates none.
    async fn put_if_absent(&self, key: &str, body: Bytes) -> StoreResult<()>;

    /// Fetch the full body stored at `key`
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Stream every key starting with `prefix`, in no guaranteed order.
    ///
    /// Backends fetch pages lazily as the stream is polled; any page
    /// failure surfaces as an `Err` item.
    fn list(&self, prefix: &str) -> BoxStream<'_, StoreResult<String>>;
}

/// Open the backend named by the storage configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(ObjectStoreBackend::in_memory())),
        StorageBackend::Local => {
            let path = config.path.clone().ok_or_else(|| {
                Error::Config("storage.path is required for the local backend".into())
            })?;
            let store = ObjectStoreBackend::local(&path)
                .map_err(|e| Error::storage("open", path.display().to_string(), e))?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::tempdir;

    #[test]
    fn test_open_local_requires_path() {
        let config = StorageConfig {
            backend: StorageBackend::Local,
            path: None,
        };
        assert!(matches!(open_store(&config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_open_local_creates_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("nested").join("root");
        let config = StorageConfig {
            backend: StorageBackend::Local,
            path: Some(root.clone()),
        };

        let store = open_store(&config).unwrap();
        assert!(root.is_dir());
        store.put_if_absent("ns/1", Bytes::from_static(b"x")).await.unwrap();
        let keys: Vec<String> = store.list("ns/").try_collect().await.unwrap();
        assert_eq!(keys, vec!["ns/1"]);
    }

    #[tokio::test]
    async fn test_open_memory() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            path: None,
        };
        let store = open_store(&config).unwrap();
        assert!(matches!(store.get("ns/1").await, Err(StoreError::NotFound)));
    }
}
