//! # SchemaVault Registry
//!
//! A versioned registry for API schema documents (JSON and YAML) that provides:
//! - Per-filename version numbers that auto-increment (1, 2, 3...)
//! - Immutable versions once committed
//! - Retrieval by exact version, by latest, and listing of all versions
//!
//! ## Core Concepts
//!
//! - **Blobs** hold the raw document bytes, keyed by filename and version
//! - **Metadata records** describe each committed version (filename, version, timestamp)
//! - **Commits** write the blob first and the record second; a failed record
//!   write removes the blob again, so a record never points at missing content
//! - **Latest** is always the highest committed version number
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use schemavault_registry::{DefaultRegistry, SchemaRegistry};
//! use schemavault_registry::metadata::MemoryMetadataStorage;
//! use schemavault_registry::storage::MemoryStorage;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = DefaultRegistry::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(MemoryMetadataStorage::new()),
//! );
//!
//! let record = registry.upload("petstore.json", br#"{"openapi":"3.0.0"}"#.to_vec()).await?;
//! println!("Committed {} as version {}", record.filename, record.version);
//!
//! let latest = registry.get_latest("petstore.json").await?;
//! assert_eq!(latest.record.version, record.version);
//! # Ok(())
//! # }
//! ```

pub mod allocator;
pub mod content;
pub mod digest;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod schema;
pub mod storage;

pub use allocator::VersionAllocator;
pub use content::{ContentType, ValidationError};
pub use error::{ErrorKind, RegistryError, Result};
pub use metadata::{MetadataError, MetadataStorage};
pub use registry::{DefaultRegistry, SchemaRegistry};
pub use schema::{SchemaDocument, SchemaVersion};
pub use storage::{BlobKey, BlobStorage, StorageError};

#[cfg(feature = "fs")]
pub use storage::filesystem::FileSystemStorage;

#[cfg(feature = "sqlite")]
pub use metadata::sqlite::SqliteMetadataStorage;

#[cfg(feature = "postgres")]
pub use metadata::postgres::PostgresMetadataStorage;
