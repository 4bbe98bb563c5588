//! Metadata storage for committed schema versions
//!
//! The metadata store owns the per-filename version counter. Allocating a
//! version is a single atomic operation on the store, so concurrent uploads
//! of the same filename can never be handed the same number.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use thiserror::Error;

use crate::schema::SchemaVersion;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

/// Metadata store operation errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("version {version} of {filename} already exists")]
    Conflict { filename: String, version: u64 },

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("metadata backend error: {0}")]
    Backend(String),
}

/// Abstraction for metadata storage backends
#[async_trait]
pub trait MetadataStorage: Send + Sync {
    /// Atomically reserve the next version number for `filename`.
    ///
    /// Returns 1 for a filename that has never been seen. A reserved number is
    /// never handed out again, even if the commit that reserved it fails.
    async fn next_version(&self, filename: &str) -> Result<u64, MetadataError>;

    /// Insert a new record. Fails with [`MetadataError::Conflict`] if the
    /// (filename, version) pair is already present.
    async fn insert(&self, record: &SchemaVersion) -> Result<(), MetadataError>;

    /// Point lookup of one version
    async fn get(
        &self,
        filename: &str,
        version: u64,
    ) -> Result<Option<SchemaVersion>, MetadataError>;

    /// Highest committed version, or `None` if the filename has no records
    async fn latest_version(&self, filename: &str) -> Result<Option<u64>, MetadataError>;

    /// All committed versions in ascending order
    async fn list_versions(&self, filename: &str) -> Result<Vec<u64>, MetadataError>;

    /// Check backend connectivity
    async fn health_check(&self) -> Result<(), MetadataError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, BTreeMap<u64, SchemaVersion>>,
    counters: HashMap<String, u64>,
}

/// In-memory metadata storage implementation for testing
#[derive(Debug, Default)]
pub struct MemoryMetadataStorage {
    state: Mutex<MemoryState>,
}

impl MemoryMetadataStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all filenames
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.records.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, MetadataError> {
        self.state
            .lock()
            .map_err(|_| MetadataError::Backend("Lock poisoned".into()))
    }
}

#[async_trait]
impl MetadataStorage for MemoryMetadataStorage {
    async fn next_version(&self, filename: &str) -> Result<u64, MetadataError> {
        let mut state = self.lock()?;

        let committed = state
            .records
            .get(filename)
            .and_then(|versions| versions.keys().next_back().copied())
            .unwrap_or(0);
        let counter = state.counters.entry(filename.to_string()).or_insert(0);
        *counter = (*counter).max(committed) + 1;

        Ok(*counter)
    }

    async fn insert(&self, record: &SchemaVersion) -> Result<(), MetadataError> {
        let mut state = self.lock()?;

        let versions = state.records.entry(record.filename.clone()).or_default();
        if versions.contains_key(&record.version) {
            return Err(MetadataError::Conflict {
                filename: record.filename.clone(),
                version: record.version,
            });
        }
        versions.insert(record.version, record.clone());
        Ok(())
    }

    async fn get(
        &self,
        filename: &str,
        version: u64,
    ) -> Result<Option<SchemaVersion>, MetadataError> {
        let state = self.lock()?;
        Ok(state
            .records
            .get(filename)
            .and_then(|versions| versions.get(&version))
            .cloned())
    }

    async fn latest_version(&self, filename: &str) -> Result<Option<u64>, MetadataError> {
        let state = self.lock()?;
        Ok(state
            .records
            .get(filename)
            .and_then(|versions| versions.keys().next_back().copied()))
    }

    async fn list_versions(&self, filename: &str) -> Result<Vec<u64>, MetadataError> {
        let state = self.lock()?;
        Ok(state
            .records
            .get(filename)
            .map(|versions| versions.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), MetadataError> {
        self.lock().map(|_| ())
    }
}
