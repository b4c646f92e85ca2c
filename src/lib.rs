//! Route registration and single-file upload demo servers.
//!
//! Two independent servers share this library:
//!
//! - `hello-world` registers literal, parameter (`:seg`), wildcard
//!   (`*segs`) and group-prefixed routes and answers `/ping`.
//! - `upload-file` accepts one multipart file on `POST /upload` and
//!   writes it to the upload directory.
//!
//! Routes declared without a handler are explicit placeholders that
//! answer `501 Not Implemented`.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`routing`]: Route registration and groups on top of axum
//! - [`upload`]: Multipart extraction and file storage
//! - [`api`]: Handlers and routers
//! - [`metrics`]: Prometheus metrics
//! - [`server`]: Binding and serving
//! - [`utils`]: Logging setup and shutdown signal

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routing;
pub mod server;
pub mod upload;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
