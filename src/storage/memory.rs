//! In-memory blob store.
//!
//! Keeps blobs in a `RwLock<HashMap>` keyed by path.  Directory semantics
//! mirror the filesystem store: a blob can only be written into a
//! directory that was ensured first.  Useful for tests and ephemeral
//! deployments.

use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use super::backend::BlobStore;

#[derive(Debug, Default)]
struct Inner {
    dirs: HashSet<PathBuf>,
    blobs: HashMap<PathBuf, Bytes>,
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    inner: RwLock<Inner>,
    reads: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.inner.read().expect("rwlock poisoned").blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `dir` has been ensured.
    pub fn has_dir(&self, dir: &Path) -> bool {
        self.inner.read().expect("rwlock poisoned").dirs.contains(dir)
    }

    /// Total `get` calls served, including failed ones.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl BlobStore for MemoryBlobStore {
    fn ensure_dir(
        &self,
        dir: &Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let dir = dir.to_path_buf();
        Box::pin(async move {
            let mut inner = self.inner.write().expect("rwlock poisoned");
            inner.dirs.insert(dir);
            Ok(())
        })
    }

    fn put(
        &self,
        path: &Path,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let mut inner = self.inner.write().expect("rwlock poisoned");
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            if !inner.dirs.contains(&parent) {
                anyhow::bail!("directory {} does not exist", parent.display());
            }
            inner.blobs.insert(path, data);
            Ok(())
        })
    }

    fn get(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Bytes>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            self.reads.fetch_add(1, Ordering::Relaxed);
            let inner = self.inner.read().expect("rwlock poisoned");
            inner
                .blobs
                .get(&path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no blob at {}", path.display()))
        })
    }

    fn delete(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let mut inner = self.inner.write().expect("rwlock poisoned");
            inner.blobs.remove(&path);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_requires_ensured_dir() {
        let store = MemoryBlobStore::new();
        let path = Path::new("/data/images/a.png");

        assert!(store.put(path, Bytes::from("x")).await.is_err());

        store.ensure_dir(Path::new("/data/images")).await.unwrap();
        store.put(path, Bytes::from("x")).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_counts_reads() {
        let store = MemoryBlobStore::new();
        store.ensure_dir(Path::new("/d")).await.unwrap();
        store.put(Path::new("/d/a"), Bytes::from("abc")).await.unwrap();

        assert_eq!(store.get(Path::new("/d/a")).await.unwrap(), Bytes::from("abc"));
        assert!(store.get(Path::new("/d/missing")).await.is_err());
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryBlobStore::new();
        store.ensure_dir(Path::new("/d")).await.unwrap();
        store.put(Path::new("/d/a"), Bytes::from("abc")).await.unwrap();

        store.delete(Path::new("/d/a")).await.unwrap();
        store.delete(Path::new("/d/a")).await.unwrap();
        assert!(store.is_empty());
    }
}
