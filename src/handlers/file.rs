//! `/file` API handlers: upload and the two download routes.

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use metrics::counter;

use crate::envelope::{ApiResponse, MSG_EMPTY_UPLOAD, MSG_UPLOAD_OK};
use crate::errors::FileError;
use crate::metrics::{BYTES_RECEIVED_TOTAL, BYTES_SENT_TOTAL};
use crate::pipeline::category::{classify, OCTET_STREAM};
use crate::pipeline::FileKind;
use crate::AppState;

/// Name of the multipart field carrying the upload.
const FILE_FIELD: &str = "file";

/// One uploaded part: bytes, declared content type, original filename.
struct FilePart {
    data: Bytes,
    content_type: String,
    filename: String,
}

/// Map a multipart read failure, keeping body-limit rejections distinct.
fn multipart_error(err: MultipartError, limit: u64) -> FileError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FileError::PayloadTooLarge { limit }
    } else {
        FileError::validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}

/// Public download URL for a stored file.
pub fn access_url(public_url: &str, kind: FileKind, name: &str) -> String {
    format!(
        "{}/file/{}/download/{}",
        public_url.trim_end_matches('/'),
        kind.as_str(),
        name
    )
}

/// `POST /file/upload` -- Store a single image or PDF.
#[utoipa::path(
    post,
    path = "/file/upload",
    tag = "File",
    operation_id = "UploadFile",
    request_body(content_type = "multipart/form-data", description = "Multipart body with a `file` field"),
    responses(
        (status = 200, description = "Stored; `data` holds the download URL"),
        (status = 400, description = "Empty upload, missing `file` field, or filename without extension"),
        (status = 413, description = "Upload larger than `server.max_upload_size`"),
        (status = 415, description = "Content type is not image/jpeg, image/png or application/pdf"),
        (status = 500, description = "Storage unavailable")
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, FileError> {
    let limit = state.config.server.max_upload_size;

    let mut part: Option<FilePart> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue; // Ignore unknown fields.
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        part = Some(FilePart {
            data,
            content_type,
            filename,
        });
    }

    let part = part.ok_or_else(|| FileError::validation(MSG_EMPTY_UPLOAD))?;
    let size = part.data.len() as u64;

    let record = state
        .uploads
        .store(part.data, &part.content_type, &part.filename)
        .await?;
    counter!(BYTES_RECEIVED_TOTAL).increment(size);

    let kind = classify(&record.content_type).kind().ok_or_else(|| {
        FileError::StorageUnavailable(anyhow::anyhow!(
            "stored record {} has unservable type {}",
            record.name,
            record.content_type
        ))
    })?;
    let url = access_url(&state.config.server.public_url, kind, &record.name);

    Ok((
        StatusCode::OK,
        [("content-type", "application/json")],
        ApiResponse::ok(MSG_UPLOAD_OK, url).render(),
    )
        .into_response())
}

/// `GET /file/image/download/{filename}` -- Serve an image with its probed type.
#[utoipa::path(
    get,
    path = "/file/image/download/{filename}",
    tag = "File",
    operation_id = "DownloadImage",
    params(("filename" = String, Path, description = "Generated filename returned by upload")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "No such file"),
        (status = 500, description = "Storage unavailable")
    )
)]
pub async fn download_image(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, FileError> {
    download(&state, &filename, FileKind::Image).await
}

/// `GET /file/pdf/download/{filename}` -- Serve a PDF.
#[utoipa::path(
    get,
    path = "/file/pdf/download/{filename}",
    tag = "File",
    operation_id = "DownloadPdf",
    params(("filename" = String, Path, description = "Generated filename returned by upload")),
    responses(
        (status = 200, description = "PDF bytes", content_type = "application/pdf"),
        (status = 404, description = "No such file"),
        (status = 500, description = "Storage unavailable")
    )
)]
pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, FileError> {
    download(&state, &filename, FileKind::Pdf).await
}

async fn download(state: &AppState, filename: &str, kind: FileKind) -> Result<Response, FileError> {
    let download = state.retrievals.fetch(filename, kind).await?;
    let len = download.data.len() as u64;
    counter!(BYTES_SENT_TOTAL).increment(len);

    let mut response = (StatusCode::OK, download.data).into_response();
    let hdrs = response.headers_mut();
    hdrs.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&download.media_type)
            .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM)),
    );
    hdrs.insert(header::CONTENT_LENGTH, HeaderValue::from(len));

    Ok(response)
}
