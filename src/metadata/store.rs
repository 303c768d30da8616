//! Abstract metadata store trait.
//!
//! Any metadata backend must implement [`MetadataStore`].  The trait
//! uses manually desugared async methods (pinned futures) so it can be
//! held as `Arc<dyn MetadataStore>` and backed by SQLite or memory.

use std::future::Future;
use std::pin::Pin;

// ── Record types ───────────────────────────────────────────────────

/// A persisted file record.  Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Store-assigned identifier.
    pub id: i64,
    /// Generated filename (random token + original extension); the
    /// external lookup key.
    pub name: String,
    /// Media type declared by the uploader.
    pub content_type: String,
    /// Filesystem location of the blob.
    pub path: String,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
}

/// Fields supplied by the caller when creating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    pub name: String,
    pub content_type: String,
    pub path: String,
}

// ── Trait ───────────────────────────────────────────────────────────

/// Async metadata store contract.
///
/// Implementors own their concurrency control, including rejecting a
/// second record with an existing `name`.
pub trait MetadataStore: Send + Sync + 'static {
    /// Insert a new record, assigning its `id` and `created_at`.
    fn create(
        &self,
        record: NewFileRecord,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<FileRecord>> + Send + '_>>;

    /// Look up a record by its generated name.
    fn find_by_name(
        &self,
        name: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<FileRecord>>> + Send + '_>>;

    /// Number of stored records.
    fn count(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<u64>> + Send + '_>>;
}

/// Current time as an ISO-8601 string with millisecond precision.
pub(crate) fn now_iso8601() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
