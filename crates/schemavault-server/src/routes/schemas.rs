//! Schema upload and retrieval routes

use crate::{
    AppState,
    error::{ApiError, Result},
    models::{LatestSchemaResponse, UploadResponse, VersionsResponse},
};
use axum::{
    Json, Router,
    body::Body,
    extract::{
        Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{debug, error, info};

const MISSING_FILE: &str = "failed to read file or 'file' field doesn't exist in request body";

/// Create schema routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload/schema", post(upload_schema))
        .route(
            "/getSchemaByVersion/{filename}/{version}",
            get(get_schema_by_version),
        )
        .route("/getLatestSchema/{filename}", get(get_latest_schema))
        .route("/getAllVersions/{filename}", get(get_all_versions))
}

/// Upload a schema file as the next version of its filename
async fn upload_schema(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut multipart = multipart.map_err(|e| {
        debug!("Rejected upload without multipart body: {}", e);
        ApiError::bad_request(MISSING_FILE)
    })?;

    let (filename, content) = read_file_field(&mut multipart).await?;
    info!(filename = %filename, size = content.len(), "Uploading schema");

    let record = state.registry.upload(&filename, content).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse::new(record.version)),
    ))
}

/// Pull the `file` field out of a multipart body
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(client_basename)
            .ok_or_else(|| ApiError::bad_request(MISSING_FILE))?;

        let content = field.bytes().await.map_err(multipart_error)?;

        return Ok((filename, content.to_vec()));
    }

    Err(ApiError::bad_request(MISSING_FILE))
}

fn multipart_error(e: MultipartError) -> ApiError {
    debug!("Failed to read multipart body: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("schema file exceeds the upload size limit".to_string())
    } else {
        ApiError::bad_request(MISSING_FILE)
    }
}

/// Strip any directory part a client sent along with the filename
fn client_basename(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).to_string()
}

/// Get the raw content of one exact version
async fn get_schema_by_version(
    State(state): State<AppState>,
    Path((filename, version)): Path<(String, String)>,
) -> Result<Response> {
    let version: u64 = version
        .parse()
        .map_err(|_| ApiError::bad_request("Version is not an integer"))?;
    debug!(filename = %filename, version, "Getting schema by version");

    let document = state.registry.get_version(&filename, version).await?;

    Response::builder()
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(document.content))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Get the highest version with its parsed content
async fn get_latest_schema(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>> {
    debug!(filename = %filename, "Getting latest schema");

    let document = state.registry.get_latest(&filename).await?;
    // Content was validated on upload and its digest checked on read, so a
    // parse failure here means the stored format itself cannot be read
    let content = document.parse().map_err(|e| {
        error!(
            filename = %filename,
            version = document.record.version,
            "Stored schema does not parse: {}",
            e
        );
        ApiError::internal("failed to unmarshal file to JSON")
    })?;

    let response = LatestSchemaResponse {
        filename,
        version: document.record.version,
        content,
    };

    Ok(Json(response.into_json()))
}

/// List every committed version of a schema
async fn get_all_versions(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<VersionsResponse>> {
    debug!(filename = %filename, "Listing schema versions");

    let available_versions = state.registry.list_versions(&filename).await?;

    Ok(Json(VersionsResponse { available_versions }))
}
