//! Disk-backed file storage.
//!
//! Each stored file is a pair on disk: `<id>` with the raw bytes and
//! `<id>.meta` holding the content type. Reading with `raw = true` skips
//! the sidecar and serves the bytes as an opaque stream.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid file id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A stored file: its bytes plus the content type recorded at write time.
#[derive(Debug)]
pub struct StoredFile {
    pub data: Vec<u8>,
    pub mimetype: String,
}

/// Storage collaborator for upload/download/delete flows.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn write_file(&self, id: &str, data: &[u8], mimetype: &str) -> Result<(), FileError>;

    /// Read a file. With `raw` set, the content type sidecar is ignored
    /// and the bytes come back as `application/octet-stream`.
    async fn read_file(&self, id: &str, raw: bool) -> Result<StoredFile, FileError>;

    async fn delete_file(&self, id: &str) -> Result<(), FileError>;
}

/// Files under a single root directory, created at construction.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn create(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Ids become file names; anything that could escape the root is
    /// rejected.
    fn entry_path(&self, id: &str) -> Result<PathBuf, FileError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(FileError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(id))
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut meta = path.as_os_str().to_owned();
        meta.push(".meta");
        PathBuf::from(meta)
    }
}

#[async_trait]
impl FileStorage for DiskStorage {
    async fn write_file(&self, id: &str, data: &[u8], mimetype: &str) -> Result<(), FileError> {
        let path = self.entry_path(id)?;
        fs::write(&path, data).await?;
        fs::write(Self::meta_path(&path), mimetype).await?;
        Ok(())
    }

    async fn read_file(&self, id: &str, raw: bool) -> Result<StoredFile, FileError> {
        let path = self.entry_path(id)?;
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mimetype = if raw {
            "application/octet-stream".to_string()
        } else {
            fs::read_to_string(Self::meta_path(&path))
                .await
                .unwrap_or_else(|_| "application/octet-stream".to_string())
        };

        Ok(StoredFile { data, mimetype })
    }

    async fn delete_file(&self, id: &str) -> Result<(), FileError> {
        let path = self.entry_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        // Sidecar may legitimately be absent.
        let _ = fs::remove_file(Self::meta_path(&path)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, DiskStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::create(dir.path().join("uploads")).unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn write_read_delete_round_trip() {
        let (_dir, storage) = storage().await;
        storage
            .write_file("report", b"hello", "text/plain")
            .await
            .unwrap();

        let file = storage.read_file("report", false).await.unwrap();
        assert_eq!(file.data, b"hello");
        assert_eq!(file.mimetype, "text/plain");

        let raw = storage.read_file("report", true).await.unwrap();
        assert_eq!(raw.mimetype, "application/octet-stream");

        storage.delete_file("report").await.unwrap();
        let err = storage.read_file("report", false).await.unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_files_and_bad_ids_are_rejected() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.delete_file("ghost").await.unwrap_err(),
            FileError::NotFound(_)
        ));
        assert!(matches!(
            storage.read_file("../etc/passwd", false).await.unwrap_err(),
            FileError::InvalidId(_)
        ));
        assert!(matches!(
            storage.read_file("", false).await.unwrap_err(),
            FileError::InvalidId(_)
        ));
    }
}
