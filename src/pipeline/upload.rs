//! Upload pipeline: validate, classify, name, write, record.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tracing::{info, warn};

use super::category::{classify, extract_extension, generate_name, Category};
use super::PipelineConfig;
use crate::envelope::MSG_EMPTY_UPLOAD;
use crate::errors::FileError;
use crate::metadata::store::{FileRecord, MetadataStore, NewFileRecord};
use crate::metrics::UPLOADS_TOTAL;
use crate::storage::backend::BlobStore;

pub struct UploadPipeline {
    config: PipelineConfig,
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
}

impl UploadPipeline {
    pub fn new(
        config: PipelineConfig,
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config,
            metadata,
            blobs,
        }
    }

    /// Store an uploaded file and return its record.
    ///
    /// Side effects, in order: ensure the category directory, write the
    /// blob, insert the record.  Nothing is touched when validation or
    /// classification fails.  If the insert fails the blob is removed
    /// again before the error is returned.
    pub async fn store(
        &self,
        data: Bytes,
        declared_content_type: &str,
        original_filename: &str,
    ) -> Result<FileRecord, FileError> {
        let category = classify(declared_content_type);
        let result = self
            .store_classified(data, category, declared_content_type, original_filename)
            .await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        counter!(UPLOADS_TOTAL, "category" => category.as_str(), "outcome" => outcome)
            .increment(1);

        result
    }

    async fn store_classified(
        &self,
        data: Bytes,
        category: Category,
        declared_content_type: &str,
        original_filename: &str,
    ) -> Result<FileRecord, FileError> {
        if data.is_empty() {
            return Err(FileError::validation(MSG_EMPTY_UPLOAD));
        }
        let extension = extract_extension(original_filename)?;

        let base_dir = self.config.base_dir(category).ok_or_else(|| {
            FileError::UnsupportedMediaType {
                content_type: declared_content_type.to_string(),
            }
        })?;

        let name = generate_name(extension);
        let path = base_dir.join(&name);
        let size = data.len();

        self.blobs.ensure_dir(base_dir).await?;
        self.blobs.put(&path, data).await?;

        let new_record = NewFileRecord {
            name,
            content_type: declared_content_type.to_string(),
            path: path.to_string_lossy().into_owned(),
        };

        let record = match self.metadata.create(new_record).await {
            Ok(record) => record,
            Err(insert_err) => {
                if let Err(delete_err) = self.blobs.delete(&path).await {
                    warn!(
                        "Orphaned blob at {}: record insert failed and cleanup failed: {:#}",
                        path.display(),
                        delete_err
                    );
                }
                return Err(FileError::StorageUnavailable(insert_err));
            }
        };

        info!(
            "Stored {} upload {} ({} bytes) at {}",
            category.as_str(),
            record.name,
            size,
            record.path
        );

        Ok(record)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::future::Future;
    use std::path::{Path, PathBuf};
    use std::pin::Pin;

    use crate::metadata::memory::MemoryMetadataStore;
    use crate::storage::local::LocalBlobStore;
    use crate::storage::memory::MemoryBlobStore;

    const JPEG_1K: [u8; 1024] = {
        let mut b = [0x42u8; 1024];
        b[0] = 0xFF;
        b[1] = 0xD8;
        b[2] = 0xFF;
        b
    };

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            image_dir: PathBuf::from("/vault/images"),
            pdf_dir: PathBuf::from("/vault/pdfs"),
        }
    }

    fn memory_pipeline() -> (Arc<MemoryMetadataStore>, Arc<MemoryBlobStore>, UploadPipeline) {
        let metadata = Arc::new(MemoryMetadataStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let pipeline = UploadPipeline::new(test_config(), metadata.clone(), blobs.clone());
        (metadata, blobs, pipeline)
    }

    /// Metadata store whose inserts always fail.
    struct FailingMetadataStore;

    impl MetadataStore for FailingMetadataStore {
        fn create(
            &self,
            _record: NewFileRecord,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<FileRecord>> + Send + '_>> {
            Box::pin(async { Err::<FileRecord, _>(anyhow::anyhow!("database is locked")) })
        }

        fn find_by_name(
            &self,
            _name: &str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<FileRecord>>> + Send + '_>>
        {
            Box::pin(async { Ok::<_, anyhow::Error>(None) })
        }

        fn count(&self) -> Pin<Box<dyn Future<Output = anyhow::Result<u64>> + Send + '_>> {
            Box::pin(async { Ok::<_, anyhow::Error>(0) })
        }
    }

    #[tokio::test]
    async fn test_store_image_keeps_extension() {
        let (metadata, blobs, pipeline) = memory_pipeline();

        let record = pipeline
            .store(Bytes::from_static(&JPEG_1K), "image/jpeg", "photo.JPG")
            .await
            .unwrap();

        assert!(record.name.ends_with(".JPG"));
        assert_eq!(record.content_type, "image/jpeg");
        assert_eq!(
            PathBuf::from(&record.path),
            Path::new("/vault/images").join(&record.name)
        );
        assert_eq!(blobs.len(), 1);
        assert_eq!(metadata.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_pdf_uses_pdf_dir() {
        let (_metadata, blobs, pipeline) = memory_pipeline();

        let record = pipeline
            .store(Bytes::from_static(b"%PDF-1.7"), "application/pdf", "report.pdf")
            .await
            .unwrap();

        assert!(record.path.starts_with("/vault/pdfs"));
        assert!(blobs.has_dir(Path::new("/vault/pdfs")));
        assert!(!blobs.has_dir(Path::new("/vault/images")));
    }

    #[tokio::test]
    async fn test_empty_upload_touches_nothing() {
        let (metadata, blobs, pipeline) = memory_pipeline();

        let err = pipeline
            .store(Bytes::new(), "image/png", "a.png")
            .await
            .unwrap_err();

        assert!(matches!(err, FileError::Validation { .. }));
        assert_eq!(err.to_string(), MSG_EMPTY_UPLOAD);
        assert!(blobs.is_empty());
        assert!(!blobs.has_dir(Path::new("/vault/images")));
        assert_eq!(metadata.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_type_touches_nothing() {
        let (metadata, blobs, pipeline) = memory_pipeline();

        let err = pipeline
            .store(Bytes::from_static(b"hello"), "text/plain", "notes.txt")
            .await
            .unwrap_err();

        match err {
            FileError::UnsupportedMediaType { content_type } => {
                assert_eq!(content_type, "text/plain")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(blobs.is_empty());
        assert_eq!(metadata.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_extension_rejected() {
        let (metadata, blobs, pipeline) = memory_pipeline();

        let err = pipeline
            .store(Bytes::from_static(b"png"), "image/png", "screenshot")
            .await
            .unwrap_err();

        assert!(matches!(err, FileError::Validation { .. }));
        assert!(blobs.is_empty());
        assert_eq!(metadata.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_repeated_uploads_get_distinct_names() {
        let (metadata, blobs, pipeline) = memory_pipeline();

        let mut names = HashSet::new();
        for _ in 0..200 {
            let record = pipeline
                .store(Bytes::from_static(b"same bytes"), "image/png", "same.png")
                .await
                .unwrap();
            names.insert(record.name);
        }

        assert_eq!(names.len(), 200);
        assert_eq!(blobs.len(), 200);
        assert_eq!(metadata.count().await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_blob() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let pipeline =
            UploadPipeline::new(test_config(), Arc::new(FailingMetadataStore), blobs.clone());

        let err = pipeline
            .store(Bytes::from_static(b"%PDF"), "application/pdf", "a.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, FileError::StorageUnavailable(_)));
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_store_on_disk_creates_category_dir() {
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            image_dir: root.path().join("images"),
            pdf_dir: root.path().join("pdfs"),
        };
        let metadata = Arc::new(MemoryMetadataStore::new());
        let pipeline = UploadPipeline::new(config, metadata, Arc::new(LocalBlobStore::new()));

        let record = pipeline
            .store(Bytes::from_static(b"%PDF-1.4"), "application/pdf", "doc.pdf")
            .await
            .unwrap();

        assert!(root.path().join("pdfs").is_dir());
        assert!(!root.path().join("images").exists());
        assert_eq!(std::fs::read(&record.path).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_missing_parent_dir_is_storage_error() {
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            image_dir: root.path().join("missing").join("images"),
            pdf_dir: root.path().join("pdfs"),
        };
        let metadata = Arc::new(MemoryMetadataStore::new());
        let pipeline =
            UploadPipeline::new(config, metadata.clone(), Arc::new(LocalBlobStore::new()));

        let err = pipeline
            .store(Bytes::from_static(&JPEG_1K), "image/jpeg", "a.jpg")
            .await
            .unwrap_err();

        assert!(matches!(err, FileError::StorageUnavailable(_)));
        assert_eq!(metadata.count().await.unwrap(), 0);
    }
}
