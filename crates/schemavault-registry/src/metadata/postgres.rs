//! PostgreSQL metadata storage implementation
//!
//! Uses sqlx for async database operations. Version allocation relies on an
//! upsert against `schema_counters`, whose row lock orders concurrent
//! allocations for the same filename without blocking other filenames.

use super::{MetadataError, MetadataStorage};
use crate::{digest::ContentDigest, schema::SchemaVersion};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQL metadata storage implementation
pub struct PostgresMetadataStorage {
    pool: PgPool,
}

impl PostgresMetadataStorage {
    /// Create a new PostgreSQL storage instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new PostgreSQL storage instance from a database URL and
    /// ensure the tables exist
    pub async fn from_url(database_url: &str) -> Result<Self, MetadataError> {
        let pool = PgPool::connect(database_url).await?;
        let storage = Self::new(pool);
        storage.migrate().await?;
        Ok(storage)
    }

    /// Create tables if they don't exist
    pub async fn migrate(&self) -> Result<(), MetadataError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schemas (
                id BIGSERIAL PRIMARY KEY,
                version BIGINT NOT NULL,
                filename TEXT NOT NULL,
                created_on TIMESTAMPTZ NOT NULL,
                content_type TEXT NOT NULL,
                digest TEXT NOT NULL,
                size_bytes BIGINT NOT NULL,
                UNIQUE (filename, version)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_counters (
                filename TEXT PRIMARY KEY,
                last_version BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn record_from_row(row: &PgRow) -> Result<SchemaVersion, MetadataError> {
        let content_type: String = row.try_get("content_type")?;
        let content_type = content_type
            .parse()
            .map_err(|e| MetadataError::Backend(format!("Corrupt content type: {}", e)))?;

        let digest: String = row.try_get("digest")?;
        if !ContentDigest::is_valid(&digest) {
            return Err(MetadataError::Backend(format!("Corrupt digest: {}", digest)));
        }

        Ok(SchemaVersion {
            filename: row.try_get("filename")?,
            version: row.try_get::<i64, _>("version")? as u64,
            created_at: row.try_get("created_on")?,
            content_type,
            digest,
            size_bytes: row.try_get::<i64, _>("size_bytes")? as u64,
        })
    }
}

#[async_trait]
impl MetadataStorage for PostgresMetadataStorage {
    async fn next_version(&self, filename: &str) -> Result<u64, MetadataError> {
        let version: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO schema_counters (filename, last_version)
            VALUES ($1, COALESCE((SELECT MAX(version) FROM schemas WHERE filename = $1), 0) + 1)
            ON CONFLICT (filename) DO UPDATE SET
                last_version = GREATEST(
                    schema_counters.last_version,
                    COALESCE((SELECT MAX(version) FROM schemas WHERE filename = EXCLUDED.filename), 0)
                ) + 1
            RETURNING last_version
            "#,
        )
        .bind(filename)
        .fetch_one(&self.pool)
        .await?;

        Ok(version as u64)
    }

    async fn insert(&self, record: &SchemaVersion) -> Result<(), MetadataError> {
        sqlx::query(
            r#"
            INSERT INTO schemas (version, filename, created_on, content_type, digest, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.version as i64)
        .bind(&record.filename)
        .bind(record.created_at)
        .bind(record.content_type.extension())
        .bind(&record.digest)
        .bind(record.size_bytes as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => MetadataError::Conflict {
                filename: record.filename.clone(),
                version: record.version,
            },
            other => MetadataError::Database(other),
        })?;

        Ok(())
    }

    async fn get(
        &self,
        filename: &str,
        version: u64,
    ) -> Result<Option<SchemaVersion>, MetadataError> {
        let row = sqlx::query(
            r#"
            SELECT version, filename, created_on, content_type, digest, size_bytes
            FROM schemas
            WHERE filename = $1 AND version = $2
            "#,
        )
        .bind(filename)
        .bind(version as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn latest_version(&self, filename: &str) -> Result<Option<u64>, MetadataError> {
        let latest: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schemas WHERE filename = $1")
                .bind(filename)
                .fetch_one(&self.pool)
                .await?;

        Ok(latest.map(|v| v as u64))
    }

    async fn list_versions(&self, filename: &str) -> Result<Vec<u64>, MetadataError> {
        let versions: Vec<i64> =
            sqlx::query_scalar("SELECT version FROM schemas WHERE filename = $1 ORDER BY version")
                .bind(filename)
                .fetch_all(&self.pool)
                .await?;

        Ok(versions.into_iter().map(|v| v as u64).collect())
    }

    async fn health_check(&self) -> Result<(), MetadataError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
