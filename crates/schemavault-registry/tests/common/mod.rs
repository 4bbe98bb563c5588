//! Storage doubles that fail on demand

#![allow(dead_code)]

use async_trait::async_trait;
use schemavault_registry::metadata::MemoryMetadataStorage;
use schemavault_registry::storage::MemoryStorage;
use schemavault_registry::{
    BlobKey, BlobStorage, DefaultRegistry, MetadataError, MetadataStorage, SchemaVersion,
    StorageError,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Notify, Semaphore};

/// Blob store wrapper whose writes and deletes can be switched to fail
#[derive(Default)]
pub struct FlakyBlobs {
    pub inner: MemoryStorage,
    pub fail_put: AtomicBool,
    pub fail_delete: AtomicBool,
}

#[async_trait]
impl BlobStorage for FlakyBlobs {
    async fn put(&self, key: &BlobKey, data: Vec<u8>) -> Result<(), StorageError> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("disk full".into()));
        }
        self.inner.put(key, data).await
    }

    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError> {
        self.inner.get(key).await
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }

    async fn delete(&self, key: &BlobKey) -> Result<(), StorageError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("device busy".into()));
        }
        self.inner.delete(key).await
    }
}

/// Blob store wrapper that holds the write of one version until released
pub struct GatedBlobs {
    pub inner: MemoryStorage,
    gated: (String, u64),
    gate: Semaphore,
    entered: Notify,
}

impl GatedBlobs {
    pub fn new(filename: &str, version: u64) -> Self {
        Self {
            inner: MemoryStorage::new(),
            gated: (filename.to_string(), version),
            gate: Semaphore::new(0),
            entered: Notify::new(),
        }
    }

    /// Wait until the gated write has started
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated write through
    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl BlobStorage for GatedBlobs {
    async fn put(&self, key: &BlobKey, data: Vec<u8>) -> Result<(), StorageError> {
        if key.filename == self.gated.0 && key.version == self.gated.1 {
            self.entered.notify_one();
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        self.inner.put(key, data).await
    }

    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, StorageError> {
        self.inner.get(key).await
    }

    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }

    async fn delete(&self, key: &BlobKey) -> Result<(), StorageError> {
        self.inner.delete(key).await
    }
}

/// Metadata store wrapper whose inserts can be switched to fail
#[derive(Default)]
pub struct FlakyMetadata {
    pub inner: MemoryMetadataStorage,
    pub fail_insert: AtomicBool,
}

#[async_trait]
impl MetadataStorage for FlakyMetadata {
    async fn next_version(&self, filename: &str) -> Result<u64, MetadataError> {
        self.inner.next_version(filename).await
    }

    async fn insert(&self, record: &SchemaVersion) -> Result<(), MetadataError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(MetadataError::Backend("connection reset".into()));
        }
        self.inner.insert(record).await
    }

    async fn get(
        &self,
        filename: &str,
        version: u64,
    ) -> Result<Option<SchemaVersion>, MetadataError> {
        self.inner.get(filename, version).await
    }

    async fn latest_version(&self, filename: &str) -> Result<Option<u64>, MetadataError> {
        self.inner.latest_version(filename).await
    }

    async fn list_versions(&self, filename: &str) -> Result<Vec<u64>, MetadataError> {
        self.inner.list_versions(filename).await
    }

    async fn health_check(&self) -> Result<(), MetadataError> {
        self.inner.health_check().await
    }
}

pub struct Harness {
    pub blobs: Arc<FlakyBlobs>,
    pub metadata: Arc<FlakyMetadata>,
    pub registry: Arc<DefaultRegistry>,
}

pub fn harness() -> Harness {
    let blobs = Arc::new(FlakyBlobs::default());
    let metadata = Arc::new(FlakyMetadata::default());
    let registry = Arc::new(DefaultRegistry::new(blobs.clone(), metadata.clone()));
    Harness {
        blobs,
        metadata,
        registry,
    }
}
