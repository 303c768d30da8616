//! Upload classification and generated-name construction.

use crate::errors::FileError;

/// Storage category derived from a declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Image,
    Pdf,
    Unsupported,
}

impl Category {
    /// Metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Pdf => "pdf",
            Category::Unsupported => "unsupported",
        }
    }

    /// Download route serving this category, if any.
    pub fn kind(self) -> Option<FileKind> {
        match self {
            Category::Image => Some(FileKind::Image),
            Category::Pdf => Some(FileKind::Pdf),
            Category::Unsupported => None,
        }
    }
}

/// Kind requested by a download route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    /// Route segment and metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Pdf => "pdf",
        }
    }
}

/// Media type always reported for PDF downloads.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Fallback when probing an image blob is inconclusive.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Map a declared content type onto a storage category.
///
/// Matching is exact, as declared by the uploader.
pub fn classify(declared_content_type: &str) -> Category {
    match declared_content_type {
        "image/jpeg" | "image/png" => Category::Image,
        "application/pdf" => Category::Pdf,
        _ => Category::Unsupported,
    }
}

/// Longest accepted extension, dot included.  A hyphenated UUID is 36
/// bytes, so generated names stay within the usual 255-byte filename limit.
pub const MAX_EXTENSION_LEN: usize = 255 - 36;

/// Return the extension of `original_filename`, including the leading dot.
///
/// The extension is everything after the last `.` and must be non-empty
/// ASCII alphanumerics of at most [`MAX_EXTENSION_LEN`] bytes, so the
/// generated name is a valid filename and a single URL path segment.
pub fn extract_extension(original_filename: &str) -> Result<&str, FileError> {
    let dot = original_filename.rfind('.').ok_or_else(|| {
        FileError::validation(format!(
            "Filename '{original_filename}' has no extension"
        ))
    })?;
    let ext = &original_filename[dot..];

    if ext.len() == 1 {
        return Err(FileError::validation(format!(
            "Filename '{original_filename}' has an empty extension"
        )));
    }
    if ext.len() > MAX_EXTENSION_LEN {
        return Err(FileError::validation(format!(
            "Filename extension is longer than {} bytes",
            MAX_EXTENSION_LEN - 1
        )));
    }
    if !ext[1..].bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(FileError::validation(format!(
            "Filename '{original_filename}' has an invalid extension"
        )));
    }

    Ok(ext)
}

/// A fresh random name: UUIDv4 in hyphenated form plus `extension`.
pub fn generate_name(extension: &str) -> String {
    format!("{}{}", uuid::Uuid::new_v4(), extension)
}
