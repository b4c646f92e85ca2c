//! Unified error types for the demo servers.

use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Top-level error for server startup.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Route table could not be built.
    #[error("route error: {0}")]
    Route(#[from] RouteError),

    /// Listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to bind.
        addr: SocketAddr,
        /// Underlying socket error.
        source: std::io::Error,
    },

    /// Metrics recorder could not be installed.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Route registration errors, raised when a route table is built.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RouteError {
    /// The same method and pattern were registered twice.
    #[error("duplicate route: {method} {pattern}")]
    Duplicate {
        /// HTTP method.
        method: String,
        /// Full path pattern.
        pattern: String,
    },

    /// Two patterns the path matcher cannot tell apart, such as renamed
    /// parameters or a parameter and a wildcard at the same position.
    #[error("route {pattern} conflicts with {existing}")]
    Conflict {
        /// Pattern being registered.
        pattern: String,
        /// Pattern registered first.
        existing: String,
    },

    /// The pattern is not a valid path template.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// Full path pattern.
        pattern: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Upload request failures. Every variant maps to an HTTP status.
#[derive(Error, Debug, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum UploadError {
    /// Body is not a readable multipart form.
    #[error("invalid multipart form: {0}")]
    InvalidForm(String),

    /// No field with the expected name.
    #[error("missing form field {0:?}")]
    MissingField(&'static str),

    /// Field exists but carries no filename.
    #[error("form field {0:?} is not a file")]
    NotAFile(&'static str),

    /// Filename cannot be used as a storage key.
    #[error("unsafe filename {name:?}: {reason}")]
    UnsafeFilename {
        /// Filename sent by the client.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Body exceeded the configured limit.
    #[error("upload exceeds {limit} bytes")]
    TooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Writing the file failed.
    #[error("failed to store upload: {0}")]
    Storage(#[from] std::io::Error),
}

impl UploadError {
    /// HTTP status returned to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidForm(_)
            | Self::MissingField(_)
            | Self::NotAFile(_)
            | Self::UnsafeFilename { .. } => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the client is at fault.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human readable message.
    pub error: String,
    /// Stable snake_case error kind.
    pub kind: &'static str,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            kind: (&self).into(),
        };
        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_errors_map_to_statuses() {
        assert_eq!(
            UploadError::MissingField("file").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UploadError::TooLarge { limit: 8 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = UploadError::from(io);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_client_error());
    }

    #[test]
    fn upload_error_kind_is_snake_case() {
        let err = UploadError::UnsafeFilename {
            name: "../x".to_string(),
            reason: "parent directory reference",
        };
        assert_eq!(err.as_ref(), "unsafe_filename");

        let kind: &'static str = (&UploadError::MissingField("file")).into();
        assert_eq!(kind, "missing_field");
    }
}
