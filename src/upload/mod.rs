//! Single-file upload: extraction, filename validation and storage.

pub mod extract;
pub mod storage;

use std::sync::Arc;

use axum::extract::Multipart;
use tracing::info;

use crate::error::UploadError;
use crate::metrics;

pub use extract::{field_chunks, multipart_error, UploadedFile, FILE_FIELD};
pub use storage::{FileStore, SavedFile, StorageKey};

/// State shared with the upload handler.
#[derive(Debug, Clone)]
pub struct UploadState {
    /// Where uploads are written.
    pub store: Arc<FileStore>,
    /// Request body limit, in bytes.
    pub max_upload_bytes: usize,
}

impl UploadState {
    /// Create new upload state.
    pub fn new(store: FileStore, max_upload_bytes: usize) -> Self {
        Self {
            store: Arc::new(store),
            max_upload_bytes,
        }
    }
}

/// Receive one file and store it. Returns the stored key.
///
/// The first field named `file` is streamed straight into the store;
/// fields with other names are skipped.
pub async fn receive(
    state: &UploadState,
    multipart: &mut Multipart,
) -> Result<StorageKey, UploadError> {
    let limit = state.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file = UploadedFile::from_field(&field, FILE_FIELD)?;
        info!(
            filename = %file.file_name,
            content_type = file.content_type.as_deref().unwrap_or("-"),
            "upload received"
        );

        let key = StorageKey::parse(&file.file_name)?;

        let timer = metrics::timer_upload_save();
        let saved = state
            .store
            .save_stream(&key, field_chunks(field, limit))
            .await?;
        drop(timer);

        metrics::add_upload_bytes(saved.bytes);
        return Ok(key);
    }

    Err(UploadError::MissingField(FILE_FIELD))
}
