//! Object storage collaborator contract.
//!
//! The pipeline only ever downloads a stored object into a scratch path it
//! owns; upload and listing belong to the surrounding platform.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreError;

/// Read-side contract of the platform object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the object at `object_key` into `dest`.
    async fn download(&self, object_key: &str, dest: &Path) -> Result<(), StoreError>;

    /// Whether the object exists. Not used by the pipeline itself, but
    /// available to callers.
    async fn exists(&self, object_key: &str) -> Result<bool, StoreError>;
}

/// Directory-backed object store, used by the CLI and tests.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`; object keys resolve relative to it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn download(&self, object_key: &str, dest: &Path) -> Result<(), StoreError> {
        let source = self.root.join(object_key);
        if !tokio::fs::try_exists(&source).await? {
            return Err(StoreError::NotFound(object_key.to_string()));
        }
        let bytes = tokio::fs::copy(&source, dest).await?;
        debug!(object_key, bytes, "downloaded object");
        Ok(())
    }

    async fn exists(&self, object_key: &str) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(self.root.join(object_key)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("asset.txt"), b"payload").unwrap();

        let store = LocalObjectStore::new(dir.path());
        assert!(store.exists("asset.txt").await.unwrap());
        assert!(!store.exists("missing.txt").await.unwrap());

        let dest = dir.path().join("downloaded.txt");
        store.download("asset.txt", &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_local_store_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let dest = dir.path().join("out");
        let err = store.download("nope", &dest).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
