//! Writing uploads to the upload directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Bytes;
use futures::{stream, Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::UploadError;

/// Longest accepted filename, in bytes. Leaves room for the temp-file
/// suffix under the usual 255-byte name limit.
pub const MAX_KEY_LEN: usize = 200;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A client filename that is safe to use as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Validate a client-supplied filename.
    pub fn parse(name: &str) -> Result<Self, UploadError> {
        let reject = |reason| UploadError::UnsafeFilename {
            name: name.to_string(),
            reason,
        };

        if name.is_empty() {
            return Err(reject("empty filename"));
        }
        if name == "." || name == ".." {
            return Err(reject("parent directory reference"));
        }
        if name.contains(['/', '\\']) {
            return Err(reject("path separator"));
        }
        if name.contains('\0') {
            return Err(reject("nul byte"));
        }
        if name.len() > MAX_KEY_LEN {
            return Err(reject("filename too long"));
        }

        Ok(Self(name.to_string()))
    }

    /// The filename.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    /// Final location.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
}

/// Upload directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Destination path for `key`.
    pub fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    fn temp_path_for(&self, key: &StorageKey) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{}.{}-{}.part", key, std::process::id(), n))
    }

    /// Write `data` under `key`, replacing any existing file.
    pub async fn save(&self, key: &StorageKey, data: &[u8]) -> Result<SavedFile, UploadError> {
        let chunks = stream::iter([Ok::<_, UploadError>(Bytes::copy_from_slice(data))]);
        self.save_stream(key, chunks).await
    }

    /// Write a stream of chunks under `key`, replacing any existing file.
    ///
    /// Chunks go to a private temp file as they arrive; once the stream
    /// ends the file is synced and renamed over the destination, so readers
    /// and concurrent writers of the same key only ever see a complete
    /// file. If the stream or the filesystem fails, the temp file is
    /// removed, the destination is left untouched and the error is
    /// returned as is.
    pub async fn save_stream<S>(&self, key: &StorageKey, chunks: S) -> Result<SavedFile, UploadError>
    where
        S: Stream<Item = Result<Bytes, UploadError>>,
    {
        let dest = self.path_for(key);
        let temp = self.temp_path_for(key);

        let result = async {
            let bytes = write_synced(&temp, chunks).await?;
            fs::rename(&temp, &dest).await?;
            Ok::<_, UploadError>(bytes)
        }
        .await;

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                if let Err(cleanup) = fs::remove_file(&temp).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %temp.display(), error = %cleanup, "failed to remove temp file");
                    }
                }
                return Err(err);
            }
        };

        debug!(path = %dest.display(), bytes, "upload stored");
        Ok(SavedFile { path: dest, bytes })
    }
}

async fn write_synced<S>(path: &Path, chunks: S) -> Result<u64, UploadError>
where
    S: Stream<Item = Result<Bytes, UploadError>>,
{
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    futures::pin_mut!(chunks);
    let mut written = 0u64;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.sync_all().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn accepts_plain_filenames() {
        let key = assert_ok!(StorageKey::parse("a.txt"));
        assert_eq!(key.as_str(), "a.txt");
        assert_ok!(StorageKey::parse(".hidden"));
        assert_ok!(StorageKey::parse("report..final.pdf"));
    }

    #[test]
    fn rejects_traversal_and_separators() {
        for name in ["", ".", "..", "../etc/passwd", "a/b", "..\\win", "nul\0byte"] {
            let err = assert_err!(StorageKey::parse(name));
            assert!(err.is_client_error(), "{name:?} should be a client error");
        }
        assert_err!(StorageKey::parse(&"x".repeat(MAX_KEY_LEN + 1)));
    }

    #[tokio::test]
    async fn save_writes_file_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = StorageKey::parse("a.txt").unwrap();

        let saved = store.save(&key, b"hi").await.unwrap();

        assert_eq!(saved.path, dir.path().join("a.txt"));
        assert_eq!(saved.bytes, 2);
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"hi");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("a.txt")]);
    }

    #[tokio::test]
    async fn save_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = StorageKey::parse("a.txt").unwrap();

        store.save(&key, b"first version").await.unwrap();
        store.save(&key, b"v2").await.unwrap();

        assert_eq!(std::fs::read(store.path_for(&key)).unwrap(), b"v2");
    }

    #[tokio::test]
    async fn save_into_missing_dir_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("missing"));
        let key = StorageKey::parse("a.txt").unwrap();

        let err = store.save(&key, b"hi").await.unwrap_err();

        assert!(matches!(err, UploadError::Storage(_)));
        assert!(!store.path_for(&key).exists());
    }

    #[tokio::test]
    async fn save_stream_writes_chunks_in_order() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = StorageKey::parse("parts.txt").unwrap();

        let chunks = stream::iter(["he", "llo", " world"].map(|part| Ok::<_, UploadError>(Bytes::from(part))));
        let saved = store.save_stream(&key, chunks).await.unwrap();

        assert_eq!(saved.bytes, 11);
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn failed_stream_removes_temp_and_keeps_destination() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = StorageKey::parse("a.txt").unwrap();
        store.save(&key, b"old").await.unwrap();

        let chunks = stream::iter([
            Ok(Bytes::from_static(b"partial")),
            Err(UploadError::TooLarge { limit: 7 }),
        ]);
        let err = store.save_stream(&key, chunks).await.unwrap_err();

        assert!(matches!(err, UploadError::TooLarge { limit: 7 }));
        assert_eq!(std::fs::read(store.path_for(&key)).unwrap(), b"old");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn concurrent_saves_keep_one_complete_body() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let key = StorageKey::parse("same.bin").unwrap();

        let first = vec![b'a'; 256 * 1024];
        let second = vec![b'b'; 128 * 1024];

        let (a, b) = tokio::join!(store.save(&key, &first), store.save(&key, &second));
        a.unwrap();
        b.unwrap();

        let stored = std::fs::read(store.path_for(&key)).unwrap();
        assert!(stored == first || stored == second);
    }

    #[tokio::test]
    async fn ensure_dir_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("uploads"));

        store.ensure_dir().await.unwrap();

        assert!(store.dir().is_dir());
    }
}
