//! Pulling the uploaded file out of a multipart body.

use axum::{
    body::Bytes,
    extract::multipart::{Field, MultipartError},
    http::StatusCode,
};
use futures::{Stream, TryStreamExt};

use crate::error::UploadError;

/// Form field that carries the upload.
pub const FILE_FIELD: &str = "file";

/// Headers of a file field. The contents are streamed separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Filename as sent by the client, unvalidated.
    pub file_name: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
}

impl UploadedFile {
    /// Read the headers of `field`, which must carry a filename.
    pub fn from_field(field: &Field<'_>, field_name: &'static str) -> Result<Self, UploadError> {
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            return Err(UploadError::NotAFile(field_name));
        };

        Ok(Self {
            file_name,
            content_type: field.content_type().map(str::to_owned),
        })
    }
}

/// The field body as a stream of chunks, parse failures classified.
pub fn field_chunks<'a>(
    field: Field<'a>,
    limit: usize,
) -> impl Stream<Item = Result<Bytes, UploadError>> + 'a {
    field.map_err(move |err| multipart_error(err, limit))
}

/// Classify a multipart parse failure.
pub fn multipart_error(err: MultipartError, limit: usize) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { limit }
    } else {
        UploadError::InvalidForm(err.body_text())
    }
}
