//! Abstract blob store trait.
//!
//! Every blob store must implement [`BlobStore`].  Blobs are addressed by
//! the full path recorded in the metadata store, so callers decide where a
//! blob lives and the store only moves bytes.

use bytes::Bytes;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use super::probe;

/// Async blob storage contract.
pub trait BlobStore: Send + Sync + 'static {
    /// Create `dir` if it does not exist.
    ///
    /// Not recursive: the parent of `dir` must already exist.
    fn ensure_dir(
        &self,
        dir: &Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Write `data` to `path`, replacing any existing blob (last write wins).
    fn put(
        &self,
        path: &Path,
        data: Bytes,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Read the full blob at `path`.  A missing blob is an error.
    fn get(&self, path: &Path)
        -> Pin<Box<dyn Future<Output = anyhow::Result<Bytes>> + Send + '_>>;

    /// Remove the blob at `path`.  Removing a missing blob succeeds.
    ///
    /// Only used to compensate a write whose metadata insert failed.
    fn delete(&self, path: &Path)
        -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Best-effort media type of a stored blob, from its bytes first and
    /// its extension second.  `None` when neither is conclusive.
    fn probe_media_type(&self, path: &Path, data: &[u8]) -> Option<String> {
        probe::probe_media_type(path, data)
    }
}
