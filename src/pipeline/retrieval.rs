//! Retrieval pipeline: resolve a generated name and read the blob back.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tracing::debug;

use super::category::{FileKind, OCTET_STREAM, PDF_MEDIA_TYPE};
use crate::errors::FileError;
use crate::metadata::store::MetadataStore;
use crate::metrics::DOWNLOADS_TOTAL;
use crate::storage::backend::BlobStore;

/// Blob bytes plus the media type to serve them with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub data: Bytes,
    pub media_type: String,
}

pub struct RetrievalPipeline {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl RetrievalPipeline {
    pub fn new(metadata: Arc<dyn MetadataStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { metadata, blobs }
    }

    /// Fetch the blob recorded under `name`.
    ///
    /// Images are tagged with the probed media type of the stored bytes
    /// (octet-stream if inconclusive); PDFs are always tagged
    /// `application/pdf`.  The blob store is never read for an unknown
    /// name.
    pub async fn fetch(&self, name: &str, kind: FileKind) -> Result<Download, FileError> {
        let result = self.fetch_inner(name, kind).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        counter!(DOWNLOADS_TOTAL, "kind" => kind.as_str(), "outcome" => outcome).increment(1);

        result
    }

    async fn fetch_inner(&self, name: &str, kind: FileKind) -> Result<Download, FileError> {
        let record = self
            .metadata
            .find_by_name(name)
            .await?
            .ok_or_else(|| FileError::NotFound {
                name: name.to_string(),
            })?;

        let path = Path::new(&record.path);
        let data = self.blobs.get(path).await?;

        let media_type = match kind {
            FileKind::Image => self
                .blobs
                .probe_media_type(path, &data)
                .unwrap_or_else(|| OCTET_STREAM.to_string()),
            FileKind::Pdf => PDF_MEDIA_TYPE.to_string(),
        };

        debug!(
            "Serving {} ({} bytes, {}) from {}",
            record.name,
            data.len(),
            media_type,
            record.path
        );

        Ok(Download { data, media_type })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
