//! Error handling for the API server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use schemavault_registry::{ErrorKind, MetadataError, RegistryError};
use thiserror::Error;
use tracing::error;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Registry(RegistryError::Metadata(MetadataError::Conflict { .. })) => {
                StatusCode::CONFLICT
            }
            ApiError::Registry(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Storage | ErrorKind::Consistency => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Config(_) | ApiError::Internal(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Plain-text message sent to the client
    fn public_message(&self) -> String {
        match self {
            ApiError::Registry(RegistryError::Validation(e)) => format!("INVALID SCHEMA: {}", e),
            ApiError::Registry(e) => match e.kind() {
                ErrorKind::NotFound => "schema not found".to_string(),
                ErrorKind::Validation => format!("INVALID SCHEMA: {}", e),
                ErrorKind::Storage => "failed to access schema storage".to_string(),
                ErrorKind::Consistency => "failed to read schema file".to_string(),
            },
            ApiError::Config(_) => "Configuration error".to_string(),
            ApiError::Io(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "request failed: {}", self);
        }

        (status, self.public_message()).into_response()
    }
}

// Convenience functions for common errors
impl ApiError {
    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        Self::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemavault_registry::{StorageError, ValidationError};

    #[test]
    fn test_registry_errors_map_to_status_codes() {
        let cases = [
            (
                ApiError::from(RegistryError::SchemaNotFound {
                    filename: "a.json".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(RegistryError::Validation(ValidationError::UnsupportedType {
                    extension: "txt".into(),
                })),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(RegistryError::Blob(StorageError::Backend("disk".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(RegistryError::Consistency {
                    filename: "a.json".into(),
                    version: 1,
                    reason: "blob missing".into(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::from(RegistryError::Metadata(MetadataError::Conflict {
                    filename: "a.json".into(),
                    version: 1,
                })),
                StatusCode::CONFLICT,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error:?}");
        }
    }

    #[test]
    fn test_validation_message_is_prefixed() {
        let error = ApiError::from(RegistryError::Validation(ValidationError::UnsupportedType {
            extension: "txt".into(),
        }));
        assert_eq!(
            error.public_message(),
            "INVALID SCHEMA: unsupported file type: txt"
        );
    }
}
