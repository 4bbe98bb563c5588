//! Schema version records and documents

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{content::ContentType, digest::ContentDigest, storage::BlobKey};

/// Metadata record for one committed version of a schema file.
///
/// `(filename, version)` identifies the record. Records are append-only and
/// are never modified after they are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Logical document name as supplied by the client, e.g. "petstore.json"
    pub filename: String,

    /// Version number, starting at 1 for each filename
    pub version: u64,

    /// When the version was committed
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Format of the stored content
    pub content_type: ContentType,

    /// SHA-256 digest of the stored content ("sha256:...")
    pub digest: String,

    /// Length of the stored content in bytes
    pub size_bytes: u64,
}

impl SchemaVersion {
    /// Build the record for `content` about to be committed as `version`
    pub fn new(
        filename: impl Into<String>,
        version: u64,
        content_type: ContentType,
        content: &[u8],
    ) -> Self {
        Self {
            filename: filename.into(),
            version,
            created_at: OffsetDateTime::now_utc(),
            content_type,
            digest: ContentDigest::of(content),
            size_bytes: content.len() as u64,
        }
    }

    /// Key of the blob holding this version's content
    pub fn blob_key(&self) -> BlobKey {
        BlobKey::new(&self.filename, self.version, self.content_type)
    }
}

/// A committed schema version together with its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDocument {
    pub record: SchemaVersion,
    pub content: Vec<u8>,
}

impl SchemaDocument {
    /// Parse the content into a JSON value according to its content type
    pub fn parse(&self) -> Result<serde_json::Value, crate::ValidationError> {
        self.record.content_type.parse(&self.content)
    }
}
