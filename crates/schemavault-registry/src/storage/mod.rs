//! Blob storage for schema content

pub mod blob_storage;

pub use blob_storage::{BlobKey, BlobStorage, MemoryStorage, StorageError};

// Filesystem implementation
#[cfg(feature = "fs")]
pub mod filesystem;
