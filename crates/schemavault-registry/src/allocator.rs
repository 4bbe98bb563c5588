//! Version allocation and the blob/metadata commit sequence
//!
//! The blob store and the metadata store cannot share a transaction, so a
//! commit writes the blob first and the record second. If the record write
//! fails the blob is deleted again. A record therefore never points at
//! missing content; at worst a blob is left without a record.
//!
//! Commits of one filename run one at a time within a process, so version
//! N is always committed (or abandoned) before N+1 is allocated. The store
//! counter keeps numbers unique across processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::{
    content::ContentType,
    error::Result,
    metadata::MetadataStorage,
    schema::SchemaVersion,
    storage::BlobStorage,
};

/// Per-filename commit locks. Entries are dropped once nobody holds or
/// waits for them.
#[derive(Default)]
struct FilenameLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl FilenameLocks {
    async fn acquire(&self, filename: &str) -> FilenameGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(filename.to_string()).or_default().clone()
        };

        FilenameGuard {
            locks: self,
            filename: filename.to_string(),
            guard: lock.lock_owned().await,
        }
    }

    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct FilenameGuard<'a> {
    locks: &'a FilenameLocks,
    filename: String,
    guard: OwnedMutexGuard<()>,
}

impl Drop for FilenameGuard<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.locks.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one in this guard: no waiters left
        if Arc::strong_count(OwnedMutexGuard::mutex(&self.guard)) == 2 {
            locks.remove(&self.filename);
        }
    }
}

/// Assigns version numbers and durably commits new schema versions
pub struct VersionAllocator {
    blobs: Arc<dyn BlobStorage>,
    metadata: Arc<dyn MetadataStorage>,
    locks: FilenameLocks,
}

impl VersionAllocator {
    pub fn new(blobs: Arc<dyn BlobStorage>, metadata: Arc<dyn MetadataStorage>) -> Self {
        Self {
            blobs,
            metadata,
            locks: FilenameLocks::default(),
        }
    }

    /// Commit `content` as the next version of `filename`.
    ///
    /// Errors from either store are returned as-is; nothing is retried.
    pub async fn commit(
        &self,
        filename: &str,
        content: Vec<u8>,
        content_type: ContentType,
    ) -> Result<SchemaVersion> {
        let _guard = self.locks.acquire(filename).await;

        // Atomic on the store: concurrent commits of one filename get distinct numbers
        let version = self.metadata.next_version(filename).await?;
        debug!(filename, version, "allocated version");

        let record = SchemaVersion::new(filename, version, content_type, &content);
        let key = record.blob_key();

        self.blobs.put(&key, content).await?;

        if let Err(err) = self.metadata.insert(&record).await {
            if let Err(cleanup_err) = self.blobs.delete(&key).await {
                warn!(
                    filename,
                    version,
                    error = %cleanup_err,
                    "failed to remove blob after metadata write failed; blob is orphaned"
                );
            }
            return Err(err.into());
        }

        info!(filename, version, digest = %record.digest, "committed schema version");
        Ok(record)
    }

    /// Number of filenames with a commit in flight
    pub fn in_flight(&self) -> usize {
        self.locks.len()
    }
}
