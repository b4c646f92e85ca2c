//! HTTP API handlers.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::warn;

use crate::error::UploadError;
use crate::metrics;
use crate::upload::{self, UploadState};

/// Body of the ping endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Reply text.
    pub message: &'static str,
}

/// Body returned by routes declared without a handler.
#[derive(Debug, Serialize)]
pub struct UnimplementedResponse {
    /// Always "route not implemented".
    pub error: &'static str,
    /// Pattern that matched.
    pub route: String,
}

/// Ping handler - always returns `{"message":"pong"}`.
pub async fn ping() -> impl IntoResponse {
    Json(MessageResponse { message: "pong" })
}

/// Second ping handler - returns `{"message":"pongpong"}`.
pub async fn pingping() -> impl IntoResponse {
    Json(MessageResponse {
        message: "pongpong",
    })
}

/// Placeholder for a route registered without behavior - returns 501.
pub async fn unimplemented_route(route: String) -> impl IntoResponse {
    warn!(route = %route, "request matched a route with no handler");
    metrics::inc_unimplemented_hits(&route);

    (
        StatusCode::NOT_IMPLEMENTED,
        Json(UnimplementedResponse {
            error: "route not implemented",
            route,
        }),
    )
}

/// Fallback for unmatched paths.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

/// Upload handler - stores the `file` field and confirms with its name.
pub async fn upload(
    State(state): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, UploadError> {
    metrics::inc_uploads_received();

    let result = match multipart {
        Ok(mut multipart) => upload::receive(&state, &mut multipart).await,
        Err(rejection) => Err(UploadError::InvalidForm(rejection.body_text())),
    };

    match result {
        Ok(key) => Ok(format!("'{key}' uploaded!")),
        Err(err) => {
            warn!(error = %err, status = %err.status(), "upload rejected");
            metrics::inc_uploads_failed((&err).into());
            Err(err)
        }
    }
}

/// Prometheus scrape endpoint.
pub async fn render_metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
