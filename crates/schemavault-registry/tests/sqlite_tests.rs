//! Registry on SQLite metadata and filesystem blobs

use schemavault_registry::{
    BlobStorage, ContentType, DefaultRegistry, ErrorKind, FileSystemStorage, MetadataError,
    MetadataStorage, SchemaRegistry, SchemaVersion, SqliteMetadataStorage,
};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

async fn sqlite_storage(temp_dir: &TempDir) -> SqliteMetadataStorage {
    let db_path = format!("sqlite:{}/schemas.db", temp_dir.path().display());
    SqliteMetadataStorage::new(&db_path).await.unwrap()
}

async fn on_disk_registry(temp_dir: &TempDir) -> (Arc<DefaultRegistry>, Arc<FileSystemStorage>) {
    let blobs = Arc::new(
        FileSystemStorage::new(temp_dir.path().join("schema_uploads"))
            .await
            .unwrap(),
    );
    let metadata = Arc::new(sqlite_storage(temp_dir).await);
    (Arc::new(DefaultRegistry::new(blobs.clone(), metadata)), blobs)
}

#[tokio::test]
async fn test_basic_sqlite_workflow() {
    let temp_dir = tempdir().unwrap();
    let (registry, _) = on_disk_registry(&temp_dir).await;

    let v1 = registry.upload("dummy.json", br#"{"a":1}"#.to_vec()).await.unwrap();
    let v2 = registry.upload("dummy.json", br#"{"a":2}"#.to_vec()).await.unwrap();
    assert_eq!((v1.version, v2.version), (1, 2));

    let first = registry.get_version("dummy.json", 1).await.unwrap();
    assert_eq!(first.content, br#"{"a":1}"#.to_vec());
    assert_eq!(first.record.digest, v1.digest);

    let latest = registry.get_latest("dummy.json").await.unwrap();
    assert_eq!(latest.record.version, 2);
    assert_eq!(latest.content, br#"{"a":2}"#.to_vec());

    assert_eq!(registry.list_versions("dummy.json").await.unwrap(), vec![1, 2]);

    let on_disk = temp_dir.path().join("schema_uploads/dummy.json/2.json");
    assert_eq!(std::fs::read(on_disk).unwrap(), br#"{"a":2}"#.to_vec());
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let temp_dir = tempdir().unwrap();
    {
        let (registry, _) = on_disk_registry(&temp_dir).await;
        registry.upload("api.yaml", b"a: 1\n".to_vec()).await.unwrap();
        registry.upload("api.yaml", b"a: 2\n".to_vec()).await.unwrap();
    }

    let (registry, _) = on_disk_registry(&temp_dir).await;
    assert_eq!(registry.list_versions("api.yaml").await.unwrap(), vec![1, 2]);
    let next = registry.upload("api.yaml", b"a: 3\n".to_vec()).await.unwrap();
    assert_eq!(next.version, 3);
}

#[tokio::test]
async fn test_unknown_filename_sqlite() {
    let temp_dir = tempdir().unwrap();
    let (registry, _) = on_disk_registry(&temp_dir).await;

    assert!(registry.list_versions("never-uploaded").await.unwrap().is_empty());
    let err = registry.get_latest("never-uploaded").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unique_filename_version_constraint() {
    let temp_dir = tempdir().unwrap();
    let storage = sqlite_storage(&temp_dir).await;

    let record = SchemaVersion::new("dup.json", 1, ContentType::Json, b"{}");
    storage.insert(&record).await.unwrap();

    match storage.insert(&record).await {
        Err(MetadataError::Conflict { filename, version }) => {
            assert_eq!(filename, "dup.json");
            assert_eq!(version, 1);
        }
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_counter_seeds_from_existing_rows() {
    let temp_dir = tempdir().unwrap();
    let storage = sqlite_storage(&temp_dir).await;

    // Rows written without going through the counter, as in older deployments
    storage
        .insert(&SchemaVersion::new("legacy.json", 4, ContentType::Json, b"{}"))
        .await
        .unwrap();

    assert_eq!(storage.next_version("legacy.json").await.unwrap(), 5);
    assert_eq!(storage.next_version("legacy.json").await.unwrap(), 6);
    assert_eq!(storage.next_version("fresh.json").await.unwrap(), 1);
    assert_eq!(storage.latest_version("legacy.json").await.unwrap(), Some(4));
    assert_eq!(storage.latest_version("fresh.json").await.unwrap(), None);
}

#[tokio::test]
async fn test_record_round_trip_through_sqlite() {
    let temp_dir = tempdir().unwrap();
    let storage = sqlite_storage(&temp_dir).await;

    let record = SchemaVersion::new("pets.yaml", 1, ContentType::Yaml, b"a: 1\n");
    storage.insert(&record).await.unwrap();

    let loaded = storage.get("pets.yaml", 1).await.unwrap().unwrap();
    assert_eq!(loaded.filename, record.filename);
    assert_eq!(loaded.content_type, ContentType::Yaml);
    assert_eq!(loaded.digest, record.digest);
    assert_eq!(loaded.size_bytes, 5);
    assert_eq!(loaded.created_at.unix_timestamp(), record.created_at.unix_timestamp());
    assert!(storage.get("pets.yaml", 2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_blob_on_disk_is_consistency_error() {
    let temp_dir = tempdir().unwrap();
    let (registry, blobs) = on_disk_registry(&temp_dir).await;

    let record = registry.upload("gone.json", b"{}".to_vec()).await.unwrap();
    blobs.delete(&record.blob_key()).await.unwrap();

    let err = registry.get_version("gone.json", 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_sqlite() {
    let temp_dir = tempdir().unwrap();
    let (registry, _) = on_disk_registry(&temp_dir).await;

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                let body = format!("writer: {i}\n").into_bytes();
                registry.upload("contended.yaml", body).await
            })
        })
        .collect();

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap().unwrap().version);
    }
    versions.sort_unstable();

    assert_eq!(versions, (1..=16).collect::<Vec<u64>>());
    assert_eq!(
        registry.list_versions("contended.yaml").await.unwrap(),
        (1..=16).collect::<Vec<u64>>()
    );
}

#[tokio::test]
async fn test_in_memory_sqlite_url() {
    let storage = SqliteMetadataStorage::new("sqlite::memory:").await.unwrap();
    storage.health_check().await.unwrap();
    assert_eq!(storage.next_version("a.json").await.unwrap(), 1);
}

#[tokio::test]
async fn test_corrupt_digest_in_row_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let storage = sqlite_storage(&temp_dir).await;

    let mut record = SchemaVersion::new("corrupt.json", 1, ContentType::Json, b"{}");
    record.digest = "sha256:not-hex".to_string();
    storage.insert(&record).await.unwrap();

    match storage.get("corrupt.json", 1).await {
        Err(MetadataError::Backend(reason)) => assert!(reason.contains("digest"), "{reason}"),
        other => panic!("expected Backend error, got {other:?}"),
    }
}
