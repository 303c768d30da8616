//! Upload and retrieval pipelines.
//!
//! [`upload::UploadPipeline`] validates, classifies, names, writes the blob
//! and then records it; [`retrieval::RetrievalPipeline`] resolves a name to
//! its record and reads the blob back with a media type.  Both share the
//! two stores and a [`PipelineConfig`].

use std::path::{Path, PathBuf};

use crate::config::StorageConfig;

pub mod category;
pub mod retrieval;
pub mod upload;

pub use category::{Category, FileKind};
pub use retrieval::{Download, RetrievalPipeline};
pub use upload::UploadPipeline;

/// Per-category base directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub image_dir: PathBuf,
    pub pdf_dir: PathBuf,
}

impl PipelineConfig {
    /// Base directory for a storage category.  `None` for unsupported uploads.
    pub fn base_dir(&self, category: Category) -> Option<&Path> {
        match category {
            Category::Image => Some(self.image_dir.as_path()),
            Category::Pdf => Some(self.pdf_dir.as_path()),
            Category::Unsupported => None,
        }
    }
}

impl From<&StorageConfig> for PipelineConfig {
    fn from(storage: &StorageConfig) -> Self {
        Self {
            image_dir: PathBuf::from(&storage.image_dir),
            pdf_dir: PathBuf::from(&storage.pdf_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_uses_its_own_dir() {
        let config = PipelineConfig {
            image_dir: PathBuf::from("/srv/images"),
            pdf_dir: PathBuf::from("/srv/pdfs"),
        };
        assert_eq!(config.base_dir(Category::Image), Some(Path::new("/srv/images")));
        assert_eq!(config.base_dir(Category::Pdf), Some(Path::new("/srv/pdfs")));
        assert_eq!(config.base_dir(Category::Unsupported), None);
    }
}
