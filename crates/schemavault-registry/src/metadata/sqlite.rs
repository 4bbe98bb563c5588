//! SQLite metadata storage implementation
//!
//! This module provides a SQLite-based implementation of the MetadataStorage trait.
//! It stores schema version records in a local SQLite database file.

use super::{MetadataError, MetadataStorage};
use crate::{digest::ContentDigest, schema::SchemaVersion};
use async_trait::async_trait;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow},
};
use std::str::FromStr;
use std::time::Duration;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// SQLite-based metadata storage implementation
pub struct SqliteMetadataStorage {
    pool: SqlitePool,
}

impl SqliteMetadataStorage {
    /// Create a new SQLite storage instance with the given database URL,
    /// e.g. `sqlite:./data/schemavault.db` or `sqlite::memory:`
    pub async fn new(database_url: &str) -> Result<Self, MetadataError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        // `sqlite::memory:` databases are private to one connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<(), MetadataError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schemas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                version INTEGER NOT NULL,
                filename TEXT NOT NULL,
                created_on TEXT NOT NULL,            -- RFC 3339
                content_type TEXT NOT NULL,          -- "json" | "yaml"
                digest TEXT NOT NULL,                -- "sha256:..."
                size_bytes INTEGER NOT NULL,
                UNIQUE (filename, version)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        // Last version handed out per filename, including failed commits
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_counters (
                filename TEXT PRIMARY KEY,
                last_version INTEGER NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn record_from_row(row: &SqliteRow) -> Result<SchemaVersion, MetadataError> {
        let created_on: String = row.try_get("created_on")?;
        let created_at = OffsetDateTime::parse(&created_on, &Rfc3339)
            .map_err(|e| MetadataError::Backend(format!("Failed to parse timestamp: {}", e)))?;

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
            created_at,
            content_type,
            digest,
            size_bytes: row.try_get::<i64, _>("size_bytes")? as u64,
        })
    }
}

#[async_trait]
impl MetadataStorage for SqliteMetadataStorage {
    async fn next_version(&self, filename: &str) -> Result<u64, MetadataError> {
        let version: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO schema_counters (filename, last_version)
            VALUES (?, COALESCE((SELECT MAX(version) FROM schemas WHERE filename = ?), 0) + 1)
            ON CONFLICT (filename) DO UPDATE SET
                last_version = MAX(
                    schema_counters.last_version,
                    COALESCE((SELECT MAX(version) FROM schemas WHERE filename = excluded.filename), 0)
                ) + 1
            RETURNING last_version
        "#,
        )
        .bind(filename)
        .bind(filename)
        .fetch_one(&self.pool)
        .await?;

        Ok(version as u64)
    }

    async fn insert(&self, record: &SchemaVersion) -> Result<(), MetadataError> {
        let created_on = record
            .created_at
            .format(&Rfc3339)
            .map_err(|e| MetadataError::Backend(format!("Failed to format timestamp: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO schemas (version, filename, created_on, content_type, digest, size_bytes)
            VALUES (?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(record.version as i64)
        .bind(&record.filename)
        .bind(created_on)
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
            WHERE filename = ? AND version = ?
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
            sqlx::query_scalar("SELECT MAX(version) FROM schemas WHERE filename = ?")
                .bind(filename)
                .fetch_one(&self.pool)
                .await?;

        Ok(latest.map(|v| v as u64))
    }

    async fn list_versions(&self, filename: &str) -> Result<Vec<u64>, MetadataError> {
        let rows = sqlx::query(
            r#"
            SELECT version FROM schemas
            WHERE filename = ?
            ORDER BY version ASC
        "#,
        )
        .bind(filename)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<u64, MetadataError> {
                Ok(row.try_get::<i64, _>("version")? as u64)
            })
            .collect()
    }

    async fn health_check(&self) -> Result<(), MetadataError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
