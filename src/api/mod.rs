//! HTTP API module for the ping, placeholder, upload and metrics endpoints.

pub mod handlers;
pub mod routes;

pub use routes::{create_hello_world_router, create_upload_router, metrics_router, Variant};
