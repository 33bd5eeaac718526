//! `object_store` backed storage
//!
//! Adapts any [`object_store::ObjectStore`] to the log's narrow storage
//! contract. Conditional writes map to `PutMode::Create`, which both the
//! in-memory and local filesystem stores implement atomically (the local
//! store stages the body and publishes it with a hard link).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore as _, PutMode, PutPayload};

use super::{ObjectStore, StoreError, StoreResult};

/// Log storage over an [`object_store::ObjectStore`]
pub struct ObjectStoreBackend {
    inner: Arc<dyn object_store::ObjectStore>,
}

impl ObjectStoreBackend {
    pub fn new(inner: Arc<dyn object_store::ObjectStore>) -> Self {
        Self { inner }
    }

    /// Store held entirely in process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// Store rooted at a local directory, created if missing
    pub fn local(root: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;
        let store = LocalFileSystem::new_with_prefix(root).map_err(map_error)?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Replace the body at `key` unconditionally.
    ///
    /// Bypasses the conditional-write contract; meant for injecting
    /// corruption or foreign objects in tests.
    pub async fn overwrite(&self, key: &str, body: impl Into<Bytes>) -> StoreResult<()> {
        let path = object_path(key)?;
        self.inner
            .put(&path, PutPayload::from(body.into()))
            .await
            .map_err(map_error)?;
        Ok(())
    }

    /// Number of stored objects
    pub async fn len(&self) -> StoreResult<usize> {
        let objects: Vec<_> = self.inner.list(None).try_collect().await.map_err(map_error)?;
        Ok(objects.len())
    }

    pub async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Parse a key into a store path, refusing anything that is not a plain
/// relative path of non-empty segments
fn object_path(key: &str) -> StoreResult<Path> {
    if key.is_empty() || key.starts_with('/') || key.ends_with('/') {
        return Err(StoreError::InvalidKey(format!(
            "{key:?} is not a relative object path"
        )));
    }
    Path::parse(key).map_err(|e| StoreError::InvalidKey(format!("{key:?}: {e}")))
}

fn map_error(err: object_store::Error) -> StoreError {
    match err {
        object_store::Error::AlreadyExists { .. } => StoreError::AlreadyExists,
        object_store::Error::NotFound { .. } => StoreError::NotFound,
        object_store::Error::InvalidPath { source } => StoreError::InvalidKey(source.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl ObjectStore for ObjectStoreBackend {
    async fn put_if_absent(&self, key: &str, body: Bytes) -> StoreResult<()> {
        let path = object_path(key)?;
        self.inner
            .put_opts(&path, PutPayload::from(body), PutMode::Create.into())
            .await
            .map_err(map_error)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let path = object_path(key)?;
        let object = self.inner.get(&path).await.map_err(map_error)?;
        object.bytes().await.map_err(map_error)
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, StoreResult<String>> {
        // object_store lists by whole path segments; the string filter below
        // narrows a prefix that ends mid-segment
        let dir = prefix.trim_end_matches('/');
        let root = if dir.is_empty() {
            None
        } else {
            match object_path(dir) {
                Ok(path) => Some(path),
                Err(e) => return stream::once(async move { Err(e) }).boxed(),
            }
        };

        let prefix = prefix.to_string();
        self.inner
            .list(root.as_ref())
            .map(|meta| meta.map(|m| m.location.to_string()).map_err(map_error))
            .try_filter(move |key| futures::future::ready(key.starts_with(&prefix)))
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn sorted_keys(store: &ObjectStoreBackend, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = store.list(prefix).try_collect().await.unwrap();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_conditional_put() {
        let store = ObjectStoreBackend::in_memory();
        store.put_if_absent("a/1", Bytes::from_static(b"one")).await.unwrap();

        let err = store
            .put_if_absent("a/1", Bytes::from_static(b"two"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists));
        assert_eq!(store.get("a/1").await.unwrap(), Bytes::from_static(b"one"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = ObjectStoreBackend::in_memory();
        assert!(matches!(store.get("ns/nope").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_respects_prefix() {
        let store = ObjectStoreBackend::in_memory();
        for key in ["a/1", "a/2", "a/3", "ab/1", "b/1"] {
            store.put_if_absent(key, Bytes::new()).await.unwrap();
        }

        assert_eq!(sorted_keys(&store, "a/").await, vec!["a/1", "a/2", "a/3"]);
        assert!(sorted_keys(&store, "missing/").await.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_bypasses_condition() {
        let store = ObjectStoreBackend::in_memory();
        store.put_if_absent("k/1", Bytes::from_static(b"v1")).await.unwrap();
        store.overwrite("k/1", Bytes::from_static(b"v2")).await.unwrap();

        assert_eq!(store.get("k/1").await.unwrap(), Bytes::from_static(b"v2"));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rejects_malformed_keys() {
        let store = ObjectStoreBackend::in_memory();

        for key in ["", "/abs", "trailing/", "a//b", "../up", "a/./b"] {
            let err = store.put_if_absent(key, Bytes::new()).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "key {key:?}");
        }
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_local_put_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = ObjectStoreBackend::local(dir.path()).unwrap();

        store
            .put_if_absent("orders/00000000000000000001", Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let body = store.get("orders/00000000000000000001").await.unwrap();
        assert_eq!(body, Bytes::from_static(b"hello"));
        assert!(dir.path().join("orders").join("00000000000000000001").is_file());
    }

    #[tokio::test]
    async fn test_local_refuses_existing_key() {
        let dir = tempdir().unwrap();
        let store = ObjectStoreBackend::local(dir.path()).unwrap();

        store.put_if_absent("ns/k", Bytes::from_static(b"first")).await.unwrap();
        let err = store
            .put_if_absent("ns/k", Bytes::from_static(b"second"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists));
        assert_eq!(store.get("ns/k").await.unwrap(), Bytes::from_static(b"first"));
        assert_eq!(sorted_keys(&store, "ns/").await, vec!["ns/k"]);
    }

    #[tokio::test]
    async fn test_local_get_missing() {
        let dir = tempdir().unwrap();
        let store = ObjectStoreBackend::local(dir.path()).unwrap();
        assert!(matches!(store.get("ns/none").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_local_list_large_namespace() {
        let dir = tempdir().unwrap();
        let store = ObjectStoreBackend::local(dir.path()).unwrap();
        for i in 0..250 {
            store
                .put_if_absent(&format!("ns/{i:04}"), Bytes::new())
                .await
                .unwrap();
        }
        store.put_if_absent("nsx/1", Bytes::new()).await.unwrap();
        store.put_if_absent("ns/sub/b", Bytes::new()).await.unwrap();

        let keys = sorted_keys(&store, "ns/").await;
        assert_eq!(keys.len(), 251);
        assert_eq!(keys.first().map(String::as_str), Some("ns/0000"));
        assert_eq!(keys.last().map(String::as_str), Some("ns/sub/b"));
        assert!(sorted_keys(&store, "nothing/").await.is_empty());
    }
}
