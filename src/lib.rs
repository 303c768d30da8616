//! MediaVault library: upload, store and serve images and PDFs.
//!
//! Uploaded files are classified by their declared content type, written
//! to a per-category directory under a generated unique name, and recorded
//! in a metadata store so they can be served back by that name.

use std::sync::Arc;

pub mod config;
pub mod envelope;
pub mod errors;
pub mod handlers;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod server;
pub mod storage;

use crate::config::Config;
use crate::metadata::store::MetadataStore;
use crate::pipeline::{PipelineConfig, RetrievalPipeline, UploadPipeline};
use crate::storage::backend::BlobStore;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Metadata store shared by both pipelines; read directly by `/health`.
    pub metadata: Arc<dyn MetadataStore>,
    /// Upload side: classify, persist blob, record metadata.
    pub uploads: UploadPipeline,
    /// Download side: resolve name, read blob, pick media type.
    pub retrievals: RetrievalPipeline,
}

impl AppState {
    /// Wire both pipelines over the same metadata store and blob store.
    pub fn new(
        config: Config,
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let pipeline_config = PipelineConfig::from(&config.storage);
        Self {
            uploads: UploadPipeline::new(pipeline_config, metadata.clone(), blobs.clone()),
            retrievals: RetrievalPipeline::new(metadata.clone(), blobs),
            metadata,
            config,
        }
    }
}
