//! JSON response envelope shared by every `/file` endpoint.
//!
//! Successful uploads and every error body are rendered as
//! `{"status": bool, "message": string, "data": T | null}`.

use serde::Serialize;

/// Message returned when an upload carries no bytes.
pub const MSG_EMPTY_UPLOAD: &str = "Request must contain file";

/// Message returned after a successful upload.
pub const MSG_UPLOAD_OK: &str = "File upload successfully";

/// The `{status, message, data}` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub status: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Operation payload, `null` on failure.
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful envelope carrying `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// A failed envelope with no payload.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Serialize to a JSON string.
    ///
    /// Falls back to a hand-written failure body if serialization fails,
    /// which only happens for payloads with non-string map keys.
    pub fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":false,"message":"response serialization failed","data":null}"#
                .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_success() {
        let body = ApiResponse::ok(MSG_UPLOAD_OK, "http://host/file/image/download/a.png").render();
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["status"], true);
        assert_eq!(v["message"], "File upload successfully");
        assert_eq!(v["data"], "http://host/file/image/download/a.png");
    }

    #[test]
    fn test_render_failure_has_null_data() {
        let body = ApiResponse::<String>::failure(MSG_EMPTY_UPLOAD).render();
        assert_eq!(
            body,
            r#"{"status":false,"message":"Request must contain file","data":null}"#
        );
    }
}
