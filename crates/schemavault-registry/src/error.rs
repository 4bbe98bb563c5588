//! Error types for the schema registry

use thiserror::Error;

use crate::{content::ValidationError, metadata::MetadataError, storage::StorageError};

/// Registry-specific errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Schema not found: {filename}")]
    SchemaNotFound { filename: String },

    #[error("Version {version} not found for schema {filename}")]
    VersionNotFound { filename: String, version: u64 },

    #[error("Invalid schema: {0}")]
    Validation(#[from] ValidationError),

    #[error("Blob storage error: {0}")]
    Blob(#[from] StorageError),

    #[error("Metadata storage error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Inconsistent state for {filename} version {version}: {reason}")]
    Consistency {
        filename: String,
        version: u64,
        reason: String,
    },
}

/// Broad classification of a [`RegistryError`], for callers that only need
/// to decide how to surface it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The filename or version has no committed record
    NotFound,
    /// The upload was rejected before any store was touched
    Validation,
    /// A backend failed; the caller may retry
    Storage,
    /// A record exists but its content is missing or altered
    Consistency,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::SchemaNotFound { .. } | RegistryError::VersionNotFound { .. } => {
                ErrorKind::NotFound
            }
            RegistryError::Validation(_) => ErrorKind::Validation,
            RegistryError::Blob(_) | RegistryError::Metadata(_) => ErrorKind::Storage,
            RegistryError::Consistency { .. } => ErrorKind::Consistency,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
