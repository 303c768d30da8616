//! Media type probing for stored blobs.

use std::path::Path;

/// Detect a media type from magic bytes (`infer`), falling back to the
/// file extension (`mime_guess`).
pub fn probe_media_type(path: &Path, data: &[u8]) -> Option<String> {
    if let Some(kind) = infer::get(data) {
        return Some(kind.mime_type().to_string());
    }

    mime_guess::from_path(path).first().map(|m| m.to_string())
}
