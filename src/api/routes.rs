//! HTTP API route definitions.

use axum::{extract::DefaultBodyLimit, http::Method, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use strum::Display;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::handlers::{not_found, ping, pingping, render_metrics, upload};
use crate::error::RouteError;
use crate::routing::Registrar;
use crate::upload::UploadState;

/// Which hello-world route set to serve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, clap::ValueEnum)]
#[strum(serialize_all = "snake_case")]
pub enum Variant {
    /// `/ping` plus placeholders, one of them in the `/v1` group.
    #[default]
    Basic,
    /// `/ping` and `/pingping` plus placeholders.
    Chained,
}

/// Route table of the hello-world server.
pub fn hello_world_routes(variant: Variant) -> Registrar {
    let mut routes = Registrar::new();

    match variant {
        Variant::Basic => {
            routes
                .get("/ping", ping)
                .unimplemented(Method::GET, "/p/*segs")
                .unimplemented(Method::GET, "/ping/:seg");
            routes.group("/v1").unimplemented(Method::GET, "/get");
        }
        Variant::Chained => {
            routes
                .get("/ping", ping)
                .get("/pingping", pingping)
                .unimplemented(Method::GET, "/p/*segs")
                .unimplemented(Method::GET, "/ping/:seg");
        }
    }

    routes
}

/// Create the hello-world router.
pub fn create_hello_world_router(variant: Variant) -> Result<Router, RouteError> {
    let router = hello_world_routes(variant).build()?;
    Ok(with_default_layers(router))
}

/// Create the upload router.
pub fn create_upload_router(state: UploadState) -> Result<Router, RouteError> {
    let limit = state.max_upload_bytes;

    let mut routes = Registrar::new();
    routes.post("/upload", upload);

    let router = routes
        .build()?
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state);
    Ok(with_default_layers(router))
}

/// Router serving `/metrics` from the installed recorder.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(handle)
}

/// Request logging, panic recovery and the 404 fallback.
pub fn with_default_layers(router: Router) -> Router {
    router
        .fallback(not_found)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}
