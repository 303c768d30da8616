//! Prometheus metrics for MediaVault.
//!
//! Installs a global Prometheus recorder using `metrics-exporter-prometheus`,
//! defines metric name constants, provides an axum middleware for HTTP RED
//! metrics, and exposes the `/metrics` endpoint handler.

use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

// -- Metric name constants ----------------------------------------------------

/// Total HTTP requests (counter). Labels: method, path, status.
pub const HTTP_REQUESTS_TOTAL: &str = "mediavault_http_requests_total";

/// HTTP request duration in seconds (histogram). Labels: method, path.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "mediavault_http_request_duration_seconds";

/// Upload attempts (counter). Labels: category, outcome.
pub const UPLOADS_TOTAL: &str = "mediavault_uploads_total";

/// Download attempts (counter). Labels: kind, outcome.
pub const DOWNLOADS_TOTAL: &str = "mediavault_downloads_total";

/// Total bytes accepted in uploads (counter).
pub const BYTES_RECEIVED_TOTAL: &str = "mediavault_bytes_received_total";

/// Total bytes served in downloads (counter).
pub const BYTES_SENT_TOTAL: &str = "mediavault_bytes_sent_total";

// -- Global recorder installation ---------------------------------------------

/// Singleton handle to the Prometheus recorder.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus metrics recorder. Idempotent -- safe to call
/// multiple times. Returns a reference to the global handle.
pub fn init_metrics() -> anyhow::Result<&'static PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle);
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle))
}

/// Register metric descriptions with the global recorder. Call once after
/// `init_metrics()`.
pub fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(UPLOADS_TOTAL, "Upload attempts by category and outcome");
    describe_counter!(DOWNLOADS_TOTAL, "Download attempts by kind and outcome");
    describe_counter!(BYTES_RECEIVED_TOTAL, "Total bytes accepted in uploads");
    describe_counter!(BYTES_SENT_TOTAL, "Total bytes served in downloads");
}

// -- Metrics middleware -------------------------------------------------------

/// Axum middleware that records HTTP RED metrics for every request.
///
/// Excludes `/metrics` from self-instrumentation to avoid feedback loops.
/// Must be the outermost layer so it captures the full request lifecycle.
pub async fn metrics_middleware(
    req: Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Response {
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    // Do not instrument the metrics endpoint itself.
    if req.uri().path() == "/metrics" {
        return next.run(req).await;
    }

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "path" => path, "status" => status).increment(1);
    histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method, "path" => path).record(duration);

    response
}

// -- Path normalization -------------------------------------------------------

/// Normalize an actual request path to a route template for metric labels.
///
/// Generated filenames are unique per upload, so they must never become
/// label values.
///
/// Examples:
/// - `/health` -> `/health`
/// - `/file/upload` -> `/file/upload`
/// - `/file/image/download/abc.png` -> `/file/image/download/{filename}`
/// - `/anything/else` -> `/other`
fn normalize_path(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/openapi.json" => "/openapi.json",
        "/file/upload" => "/file/upload",
        _ if path.starts_with("/file/image/download/") => "/file/image/download/{filename}",
        _ if path.starts_with("/file/pdf/download/") => "/file/pdf/download/{filename}",
        _ => "/other",
    }
}

// -- Metrics endpoint handler -------------------------------------------------

/// `GET /metrics` -- Render Prometheus exposition format text.
pub async fn metrics_handler() -> Response {
    match PROMETHEUS_HANDLE.get() {
        Some(handle) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_static_routes() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/openapi.json"), "/openapi.json");
        assert_eq!(normalize_path("/file/upload"), "/file/upload");
    }

    #[test]
    fn test_normalize_path_downloads() {
        assert_eq!(
            normalize_path("/file/image/download/0f8fad5b-d9cb-469f-a165-70867728950e.png"),
            "/file/image/download/{filename}"
        );
        assert_eq!(
            normalize_path("/file/pdf/download/x.pdf"),
            "/file/pdf/download/{filename}"
        );
    }

    #[test]
    fn test_normalize_path_unknown() {
        assert_eq!(normalize_path("/file/video/download/x.mp4"), "/other");
        assert_eq!(normalize_path("/favicon.ico"), "/other");
    }
}
