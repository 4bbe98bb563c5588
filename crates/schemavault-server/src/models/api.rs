//! Response bodies of the schema endpoints
use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Body returned after a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub version: u64,
}

impl UploadResponse {
    pub fn new(version: u64) -> Self {
        Self {
            message: "Schema uploaded successfully".to_string(),
            version,
        }
    }
}

/// Body of the version listing endpoint
#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    pub available_versions: Vec<u64>,
}

/// Latest version of a schema with its parsed content under `file-<filename>`
#[derive(Debug)]
pub struct LatestSchemaResponse {
    pub filename: String,
    pub version: u64,
    pub content: Value,
}

impl LatestSchemaResponse {
    pub fn into_json(self) -> Value {
        let mut body = Map::new();
        body.insert("version".to_string(), Value::from(self.version));
        body.insert(format!("file-{}", self.filename), self.content);
        Value::Object(body)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            service: "schemavault-server",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}
