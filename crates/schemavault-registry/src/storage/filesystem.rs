//! Filesystem blob storage
//!
//! Directory structure:
//! ```text
//! base_path/
//! ├── petstore.json/
//! │   ├── 1.json
//! │   ├── 2.json
//! │   └── ...
//! └── orders.yaml/
//!     └── 1.yaml
//! ```

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::blob_storage::{BlobKey, BlobStorage, StorageError};

/// Blob storage rooted at a local directory
pub struct FileSystemStorage {
    base_path: PathBuf,
}

impl FileSystemStorage {
    /// Create a new filesystem storage, creating the base directory if needed
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| map_io_error(e, &base_path))?;

        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get path to a schema file's version directory
    fn schema_dir(&self, key: &BlobKey) -> Result<PathBuf, StorageError> {
        if key.filename.is_empty()
            || key.filename == "."
            || key.filename == ".."
            || key.filename.contains(['/', '\\', '\0'])
        {
            return Err(StorageError::InvalidKey(key.filename.clone()));
        }
        Ok(self.base_path.join(&key.filename))
    }

    /// Get path to a specific version file
    fn version_file(&self, key: &BlobKey) -> Result<PathBuf, StorageError> {
        Ok(self.schema_dir(key)?.join(format!(
            "{}.{}",
            key.version,
            key.content_type.extension()
        )))
    }
}

fn map_io_error(err: std::io::Error, path: &Path) -> StorageError {
    let path = path.display().to_string();
    match err.kind() {
        ErrorKind::NotFound => StorageError::NotFound(path),
        ErrorKind::AlreadyExists => StorageError::AlreadyExists(path),
        ErrorKind::PermissionDenied => StorageError::AccessDenied(path),
        _ => StorageError::Backend(format!("{}: {}", path, err)),
    }
}

#[async_trait]
impl BlobStorage for FileSystemStorage {
    async fn put(&self, key: &BlobKey, data: Vec<u8>) -> Result<(), StorageError> {
        let dir = self.schema_dir(key)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| map_io_error(e, &dir))?;

        let path = self.version_file(key)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| map_io_error(e, &path))?;

        let written = async {
            file.write_all(&data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // Drop the partial file so the key reads as absent
            let _ = fs::remove_file(&path).await;
            return Err(map_io_error(e, &path));
        }

        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError> {
        let path = self.version_file(key)?;
        fs::read(&path).await.map_err(|e| map_io_error(e, &path))
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        let path = self.version_file(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| map_io_error(e, &path))
    }

    async fn delete(&self, key: &BlobKey) -> Result<(), StorageError> {
        let path = self.version_file(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io_error(e, &path)),
        }
    }
}
