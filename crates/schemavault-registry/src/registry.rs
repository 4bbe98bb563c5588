//! High-level registry interface for schema management

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    allocator::VersionAllocator,
    content,
    digest::ContentDigest,
    error::{RegistryError, Result},
    metadata::MetadataStorage,
    schema::{SchemaDocument, SchemaVersion},
    storage::{BlobStorage, StorageError},
};

/// High-level schema registry interface
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// Validate and commit `content` as the next version of `filename`
    async fn upload(&self, filename: &str, content: Vec<u8>) -> Result<SchemaVersion>;

    /// Get one exact version
    async fn get_version(&self, filename: &str, version: u64) -> Result<SchemaDocument>;

    /// Get the highest committed version
    async fn get_latest(&self, filename: &str) -> Result<SchemaDocument>;

    /// List all committed versions in ascending order; empty for unknown filenames
    async fn list_versions(&self, filename: &str) -> Result<Vec<u64>>;

    /// Check that the storage backends are reachable
    async fn health_check(&self) -> Result<()>;
}

/// Default implementation of the schema registry
pub struct DefaultRegistry {
    allocator: VersionAllocator,
    blobs: Arc<dyn BlobStorage>,
    metadata: Arc<dyn MetadataStorage>,
}

impl DefaultRegistry {
    /// Create a new registry with the given storage backends
    pub fn new(blobs: Arc<dyn BlobStorage>, metadata: Arc<dyn MetadataStorage>) -> Self {
        Self {
            allocator: VersionAllocator::new(blobs.clone(), metadata.clone()),
            blobs,
            metadata,
        }
    }

    /// Fetch and verify the content behind an existing record
    async fn load_document(&self, record: SchemaVersion) -> Result<SchemaDocument> {
        let key = record.blob_key();

        let content = match self.blobs.get(&key).await {
            Ok(content) => content,
            Err(StorageError::NotFound(_)) => {
                error!(
                    filename = %record.filename,
                    version = record.version,
                    "metadata record has no blob"
                );
                return Err(RegistryError::Consistency {
                    filename: record.filename,
                    version: record.version,
                    reason: "blob missing".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !ContentDigest::verify(&content, &record.digest) {
            error!(
                filename = %record.filename,
                version = record.version,
                expected = %record.digest,
                "stored blob does not match recorded digest"
            );
            return Err(RegistryError::Consistency {
                filename: record.filename,
                version: record.version,
                reason: "blob digest mismatch".to_string(),
            });
        }

        Ok(SchemaDocument { record, content })
    }
}

#[async_trait]
impl SchemaRegistry for DefaultRegistry {
    async fn upload(&self, filename: &str, content: Vec<u8>) -> Result<SchemaVersion> {
        let content_type = content::classify_and_validate(filename, &content)?;
        debug!(filename, %content_type, "schema validated");

        self.allocator.commit(filename, content, content_type).await
    }

    async fn get_version(&self, filename: &str, version: u64) -> Result<SchemaDocument> {
        let record = self
            .metadata
            .get(filename, version)
            .await?
            .ok_or_else(|| RegistryError::VersionNotFound {
                filename: filename.to_string(),
                version,
            })?;

        self.load_document(record).await
    }

    async fn get_latest(&self, filename: &str) -> Result<SchemaDocument> {
        let latest = self
            .metadata
            .latest_version(filename)
            .await?
            .ok_or_else(|| RegistryError::SchemaNotFound {
                filename: filename.to_string(),
            })?;

        self.get_version(filename, latest).await
    }

    async fn list_versions(&self, filename: &str) -> Result<Vec<u64>> {
        Ok(self.metadata.list_versions(filename).await?)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(self.metadata.health_check().await?)
    }
}
