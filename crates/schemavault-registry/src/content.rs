//! Content classification and syntactic validation
//!
//! Uploads are classified by file extension and parsed with the matching
//! parser before any store is touched. Only `json` and `yaml` are accepted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised by the upload gate. Nothing has been written when these occur.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("unsupported file type: {extension}")]
    UnsupportedType { extension: String },

    #[error("invalid filename '{filename}': {reason}")]
    InvalidFilename { filename: String, reason: String },

    #[error("failed to parse JSON schema: {reason}")]
    MalformedJson { reason: String },

    #[error("failed to parse YAML schema: {reason}")]
    MalformedYaml { reason: String },
}

/// Document format of a stored schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Json,
    Yaml,
}

impl ContentType {
    /// Classify a client-supplied filename by its extension.
    ///
    /// The extension is lower-cased and its leading dot stripped, so
    /// `Petstore.JSON` is JSON. A missing extension is unsupported.
    pub fn from_filename(filename: &str) -> Result<Self, ValidationError> {
        let extension = extension_of(filename).to_lowercase();
        extension.parse()
    }

    /// File extension used on disk for this type
    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Json => "json",
            ContentType::Yaml => "yaml",
        }
    }

    /// Check that `content` is syntactically valid for this format
    pub fn validate(&self, content: &[u8]) -> Result<(), ValidationError> {
        self.parse(content).map(|_| ())
    }

    /// Parse `content` into a JSON value. YAML documents are converted.
    pub fn parse(&self, content: &[u8]) -> Result<serde_json::Value, ValidationError> {
        match self {
            ContentType::Json => {
                serde_json::from_slice(content).map_err(|e| ValidationError::MalformedJson {
                    reason: e.to_string(),
                })
            }
            ContentType::Yaml => {
                serde_yaml::from_slice(content).map_err(|e| ValidationError::MalformedYaml {
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl FromStr for ContentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ContentType::Json),
            "yaml" => Ok(ContentType::Yaml),
            other => Err(ValidationError::UnsupportedType {
                extension: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Extension of `filename` without the leading dot, or "" if there is none
fn extension_of(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) => &filename[idx + 1..],
        None => "",
    }
}

/// Reject filenames that cannot serve as a single storage path segment
pub fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFilename {
        filename: filename.to_string(),
        reason: reason.to_string(),
    };

    if filename.is_empty() {
        return Err(invalid("filename is empty"));
    }
    if filename == "." || filename == ".." {
        return Err(invalid("filename cannot be a relative path component"));
    }
    if filename.contains(['/', '\\', '\0']) {
        return Err(invalid("filename cannot contain path separators or NUL"));
    }
    Ok(())
}

/// Full upload gate: filename shape, type classification and syntax check
pub fn classify_and_validate(
    filename: &str,
    content: &[u8],
) -> Result<ContentType, ValidationError> {
    validate_filename(filename)?;
    let content_type = ContentType::from_filename(filename)?;
    content_type.validate(content)?;
    Ok(content_type)
}
