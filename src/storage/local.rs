//! Local filesystem blob store.
//!
//! Blobs are flat files at the paths the upload pipeline resolves.
//!
//! Writes follow crash-only design: write to a temp file in the target
//! directory, fsync, rename over the final path.

use anyhow::Context;
use bytes::Bytes;
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;

use super::backend::BlobStore;

/// Stores blobs on the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct LocalBlobStore;

impl LocalBlobStore {
    pub fn new() -> Self {
        Self
    }

    /// Temp file path next to `final_path`, so the rename never crosses
    /// a filesystem boundary.
    fn temp_path(final_path: &Path) -> PathBuf {
        let id = uuid::Uuid::new_v4();
        final_path.with_file_name(format!(".tmp-{}", id))
    }
}

impl BlobStore for LocalBlobStore {
    fn ensure_dir(
        &self,
        dir: &Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let dir = dir.to_path_buf();
        Box::pin(async move {
            if dir.is_dir() {
                return Ok(());
            }
            match std::fs::create_dir(&dir) {
                Ok(()) => Ok(()),
                // Lost a race with a concurrent upload.
                Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
                Err(e) => Err(e)
                    .with_context(|| format!("failed to create directory {}", dir.display())),
            }
        })
    }

    fn put(
        &self,
        path: &Path,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let final_path = path.to_path_buf();
        Box::pin(async move {
            let tmp_path = Self::temp_path(&final_path);

            let written = (|| -> std::io::Result<()> {
                let mut file = std::fs::File::create(&tmp_path)?;
                file.write_all(&data)?;
                file.sync_all()?; // fsync
                std::fs::rename(&tmp_path, &final_path)
            })();

            if let Err(e) = written {
                let _ = std::fs::remove_file(&tmp_path);
                return Err(e)
                    .with_context(|| format!("failed to write blob at {}", final_path.display()));
            }

            Ok(())
        })
    }

    fn get(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Bytes>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let data = std::fs::read(&path)
                .with_context(|| format!("failed to read blob at {}", path.display()))?;
            Ok(Bytes::from(data))
        })
    }

    fn delete(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                // Idempotent: if the file doesn't exist, that's fine.
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e)
                    .with_context(|| format!("failed to remove blob at {}", path.display())),
            }
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, LocalBlobStore) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        (dir, LocalBlobStore::new())
    }

    #[tokio::test]
    async fn test_put_and_get_roundtrip() {
        let (dir, store) = test_store();
        let path = dir.path().join("a.png");

        let data = Bytes::from("hello world");
        store.put(&path, data.clone()).await.unwrap();

        let read = store.get(&path).await.unwrap();
        assert_eq!(read, data);
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let (dir, store) = test_store();
        store
            .put(&dir.path().join("a.pdf"), Bytes::from("%PDF-1.7"))
            .await
            .unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (dir, store) = test_store();
        let path = dir.path().join("key.jpg");

        store.put(&path, Bytes::from("version 1")).await.unwrap();
        store.put(&path, Bytes::from("version 2")).await.unwrap();

        assert_eq!(store.get(&path).await.unwrap(), Bytes::from("version 2"));
    }

    #[tokio::test]
    async fn test_put_into_missing_dir_fails() {
        let (dir, store) = test_store();
        let path = dir.path().join("missing").join("a.png");
        assert!(store.put(&path, Bytes::from("x")).await.is_err());
    }

    #[tokio::test]
    async fn test_get_nonexistent_returns_error() {
        let (dir, store) = test_store();
        let result = store.get(&dir.path().join("no-such-blob")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_once() {
        let (dir, store) = test_store();
        let images = dir.path().join("images");

        store.ensure_dir(&images).await.unwrap();
        assert!(images.is_dir());

        // Second call is a no-op.
        store.ensure_dir(&images).await.unwrap();
        assert!(images.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_dir_is_not_recursive() {
        let (dir, store) = test_store();
        let nested = dir.path().join("a").join("b");
        assert!(store.ensure_dir(&nested).await.is_err());
        assert!(!dir.path().join("a").exists());
    }

    #[tokio::test]
    async fn test_delete_existing_and_missing() {
        let (dir, store) = test_store();
        let path = dir.path().join("gone.png");

        store.put(&path, Bytes::from("data")).await.unwrap();
        store.delete(&path).await.unwrap();
        assert!(!path.exists());

        // Deleting again should succeed (idempotent).
        store.delete(&path).await.unwrap();
    }
}
