//! Filesystem blob store for uploaded membership documents.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::BaseBlobStore;

/// Stores blobs as plain files below a root directory
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative blob path, refusing anything that escapes the root
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            anyhow::bail!("Invalid blob path: {}", path);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BaseBlobStore for LocalBlobStore {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        tokio::fs::write(&target, &bytes)
            .await
            .with_context(|| format!("Failed to write blob {}", target.display()))?;

        debug!(path = %path, size = bytes.len(), "Stored blob");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                debug!(path = %path, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete blob {}", target.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store() -> (LocalBlobStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("blob-store-{}", uuid::Uuid::new_v4()));
        (LocalBlobStore::new(&root), root)
    }

    #[tokio::test]
    async fn test_put_then_delete() {
        let (store, root) = scratch_store();
        let path = "membership_documents/1/letter.pdf";

        store.put(path, Bytes::from_static(b"%PDF")).await.unwrap();
        assert!(root.join(path).exists());
        assert_eq!(
            tokio::fs::read(root.join(path)).await.unwrap(),
            b"%PDF".to_vec()
        );

        store.delete(path).await.unwrap();
        assert!(!root.join(path).exists());

        // Deleting again is fine
        store.delete(path).await.unwrap();

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let (store, _root) = scratch_store();
        assert!(store
            .put("../outside.txt", Bytes::from_static(b"x"))
            .await
            .is_err());
        assert!(store
            .put("/etc/passwd", Bytes::from_static(b"x"))
            .await
            .is_err());
        assert!(store.delete("").await.is_err());
    }
}
