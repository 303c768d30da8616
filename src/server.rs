//! Axum router construction and route mapping.
//!
//! The [`app`] function wires the `/file` API plus the infrastructure
//! endpoints to their handlers and returns a ready-to-serve
//! [`axum::Router`].

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;

use crate::errors::generate_request_id;
use crate::handlers::file::{download_image, download_pdf, upload_file};
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the MediaVault file API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MediaVault File API",
        version = "0.1.0",
        description = "Upload and download images and PDFs"
    ),
    paths(
        health_check,
        crate::handlers::file::upload_file,
        crate::handlers::file::download_image,
        crate::handlers::file::download_pdf,
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "File", description = "File upload and download"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all routes.
///
/// The returned router is ready to be passed to `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.config.server.max_upload_size).unwrap_or(usize::MAX);
    let with_metrics = state.config.observability.metrics;

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_json))
        .route("/file/upload", post(upload_file))
        .route("/file/image/download/:filename", get(download_image))
        .route("/file/pdf/download/:filename", get(download_pdf));

    if with_metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    let router = router
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(common_headers_middleware))
        .layer(TraceLayer::new_for_http());

    // metrics_middleware is outermost (captures full request lifecycle).
    if with_metrics {
        router.layer(middleware::from_fn(metrics_middleware))
    } else {
        router
    }
}

// -- Common headers middleware -----------------------------------------------

/// Adds common response headers to every response:
/// - `x-request-id`: 16-character uppercase hex string
/// - `Date`: RFC 7231 formatted timestamp
/// - `Server`: `MediaVault`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    if !headers.contains_key("x-request-id") {
        if let Ok(value) = HeaderValue::from_str(&generate_request_id()) {
            headers.insert("x-request-id", value);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    if let Ok(value) = HeaderValue::from_str(&date) {
        headers.insert("date", value);
    }
    headers.insert("server", HeaderValue::from_static("MediaVault"));

    response
}

// -- Infrastructure handlers -------------------------------------------------

/// Health check endpoint. Reports the number of stored files, so a
/// broken metadata store shows up as 503.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Server is healthy", body = String, content_type = "application/json"),
        (status = 503, description = "Metadata store unreachable", body = String, content_type = "application/json")
    )
)]
async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    match state.metadata.count().await {
        Ok(files) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok", "files": files })),
        )
            .into_response(),
        Err(e) => {
            warn!("Health check failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// -- Tests --------------------------------------------------------------------
