//! Error types for the upload and retrieval pipelines.
//!
//! Every variant maps to one HTTP status.  The enum implements
//! [`axum::response::IntoResponse`] so handlers can simply return
//! `Err(FileError::NotFound { .. })` and get the JSON envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::envelope::ApiResponse;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Failures surfaced by the store/fetch operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// Empty payload, or an original filename without a usable extension.
    #[error("{message}")]
    Validation { message: String },

    /// Declared content type is neither an image nor a PDF we accept.
    #[error("Unsupported content type: {content_type}")]
    UnsupportedMediaType { content_type: String },

    /// No file record exists under the requested name.
    #[error("File not found: {name}")]
    NotFound { name: String },

    /// Request body exceeded `server.max_upload_size`.
    #[error("Upload exceeds the maximum allowed size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// Filesystem or metadata store failure.
    #[error("Storage unavailable, please try again")]
    StorageUnavailable(#[from] anyhow::Error),
}

impl FileError {
    /// Shorthand for a [`FileError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        FileError::Validation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code, used as a metrics label.
    pub fn code(&self) -> &'static str {
        match self {
            FileError::Validation { .. } => "validation",
            FileError::UnsupportedMediaType { .. } => "unsupported_media_type",
            FileError::NotFound { .. } => "not_found",
            FileError::PayloadTooLarge { .. } => "payload_too_large",
            FileError::StorageUnavailable(_) => "storage_unavailable",
        }
    }

    /// Return the appropriate HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FileError::Validation { .. } => StatusCode::BAD_REQUEST,
            FileError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            FileError::NotFound { .. } => StatusCode::NOT_FOUND,
            FileError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FileError::StorageUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FileError {
    fn into_response(self) -> Response {
        if let FileError::StorageUnavailable(ref source) = self {
            error!("Storage failure: {:#}", source);
        }

        let status = self.status_code();
        let body = ApiResponse::<String>::failure(self.to_string()).render();

        (status, [("content-type", "application/json")], body).into_response()
    }
}
