//! Blob storage abstraction for the registry
//!
//! This module provides the core storage trait and in-memory implementation
//! for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::content::ContentType;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob already exists: {0}")]
    AlreadyExists(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invalid key format: {0}")]
    InvalidKey(String),
}

/// Address of one schema version's content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey {
    pub filename: String,
    pub version: u64,
    pub content_type: ContentType,
}

impl BlobKey {
    pub fn new(filename: impl Into<String>, version: u64, content_type: ContentType) -> Self {
        Self {
            filename: filename.into(),
            version,
            content_type,
        }
    }

    /// Relative storage path
    /// Example: "petstore.json/2.json"
    pub fn path(&self) -> String {
        format!(
            "{}/{}.{}",
            self.filename,
            self.version,
            self.content_type.extension()
        )
    }
}

/// Abstraction for blob storage backends
///
/// Implementations never overwrite: `put` on an existing key fails with
/// [`StorageError::AlreadyExists`]. `delete` of a missing key succeeds.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store data at the given key
    async fn put(&self, key: &BlobKey, data: Vec<u8>) -> Result<(), StorageError>;

    /// Retrieve data by key
    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError>;

    /// Check if key exists
    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Delete data by key
    async fn delete(&self, key: &BlobKey) -> Result<(), StorageError>;
}

/// In-memory storage implementation for testing
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.data
            .lock()
            .map_err(|_| StorageError::Backend("Lock poisoned".into()))
    }

    /// Stored paths, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.data
            .lock()
            .map(|data| data.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Get number of stored blobs
    pub fn len(&self) -> usize {
        self.data.lock().map(|data| data.len()).unwrap_or(0)
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn put(&self, key: &BlobKey, data: Vec<u8>) -> Result<(), StorageError> {
        let mut storage = self.lock()?;
        let path = key.path();
        if storage.contains_key(&path) {
            return Err(StorageError::AlreadyExists(path));
        }
        storage.insert(path, data);
        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError> {
        let path = key.path();
        self.lock()?
            .get(&path)
            .cloned()
            .ok_or(StorageError::NotFound(path))
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        Ok(self.lock()?.contains_key(&key.path()))
    }

    async fn delete(&self, key: &BlobKey) -> Result<(), StorageError> {
        self.lock()?.remove(&key.path());
        Ok(())
    }
}
