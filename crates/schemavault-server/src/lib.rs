//! SchemaVault HTTP API Server
//!
//! Exposes the schema registry over HTTP: multipart upload, retrieval by
//! exact version, retrieval of the latest version and version listing.

use axum::{Router, extract::DefaultBodyLimit, response::Json, routing::get};
use schemavault_registry::{
    DefaultRegistry, FileSystemStorage, MetadataStorage, PostgresMetadataStorage, RegistryError,
    SchemaRegistry, SqliteMetadataStorage,
};
use std::{path::Path, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

pub mod config;
pub mod error;
pub mod models;
pub mod routes;

use config::ServerConfig;
use error::{ApiError, Result};
use models::HealthResponse;

/// Main application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn SchemaRegistry>,
    pub config: ServerConfig,
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Schema routes
        .merge(routes::schemas::router())
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Build the registry from the filesystem blob store and the configured
/// metadata database
pub async fn build_registry(config: &ServerConfig) -> Result<Arc<DefaultRegistry>> {
    let blobs = FileSystemStorage::new(&config.storage_path)
        .await
        .map_err(RegistryError::from)?;
    info!("Schema blobs stored under {}", blobs.base_path().display());

    let metadata: Arc<dyn MetadataStorage> = if config.uses_postgres() {
        let storage = PostgresMetadataStorage::from_url(&config.database_url)
            .await
            .map_err(RegistryError::from)?;
        info!("Using PostgreSQL metadata storage");
        Arc::new(storage)
    } else {
        ensure_sqlite_parent_dir(&config.database_url).await?;
        let storage = SqliteMetadataStorage::new(&config.database_url)
            .await
            .map_err(RegistryError::from)?;
        info!("Using SQLite metadata storage at {}", config.database_url);
        Arc::new(storage)
    };

    Ok(Arc::new(DefaultRegistry::new(Arc::new(blobs), metadata)))
}

/// SQLite creates the database file but not its directory
async fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_file_path(database_url) else {
        return Ok(());
    };

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// File path of a `sqlite:` URL, `None` for in-memory databases
fn sqlite_file_path(database_url: &str) -> Option<&str> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(path)
    }
}

/// Health check endpoint
async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<HealthResponse>> {
    if let Err(e) = state.registry.health_check().await {
        error!("Health check failed: {}", e);
        return Err(ApiError::Unavailable("metadata storage unreachable".to_string()));
    }

    Ok(Json(HealthResponse::healthy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path("sqlite:./data/schemavault.db"),
            Some("./data/schemavault.db")
        );
        assert_eq!(
            sqlite_file_path("sqlite:///var/lib/sv.db?mode=rwc"),
            Some("/var/lib/sv.db")
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }
}
