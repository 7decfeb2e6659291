//! End-to-end reconciliation pass scenarios

use chrono::Utc;

use quillsync_core::status::OpStatus;
use quillsync_sync::run_sync;

use crate::common::{ready_engine, unit_updated_ago, with_image, MemoryBackend, MemoryStore};

const MANIFEST_PATH: &str = "remote/json/noteCombos.json";

#[tokio::test]
async fn test_first_sync_pushes_local_units_and_images() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    store.insert(unit_updated_ago("groceries", 60));
    store.insert(with_image(unit_updated_ago("trip", 30), "map.png", 9));
    std::fs::write(cache.path().join("map.png"), b"png bytes").unwrap();

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.units_pulled, 0);
    assert_eq!(report.units_pushed, 2);
    assert_eq!(report.images_uploaded, 1);
    assert_eq!(backend.manifest_units().len(), 2);
    assert_eq!(
        backend.file("remote/attachments/map.png").as_deref(),
        Some(b"png bytes".as_slice())
    );
}

#[tokio::test]
async fn test_remote_newer_unit_replaces_local() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    let local = unit_updated_ago("draft title", 3600);
    let mut remote = local.clone();
    remote.note.title = "final title".to_string();
    remote.note.updated_at = Utc::now();
    store.insert(local.clone());
    backend.seed_manifest(&[remote]);

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.units_pulled, 1);
    assert_eq!(store.get(local.id()).unwrap().note.title, "final title");
    assert_eq!(backend.manifest_units()[0].note.title, "final title");
}

#[tokio::test]
async fn test_local_newer_unit_is_kept_whole() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    let local = unit_updated_ago("kept", 10);
    let mut remote = local.clone();
    remote.note.title = "stale".to_string();
    remote.note.updated_at = Utc::now() - chrono::Duration::seconds(3600);
    store.insert(local.clone());
    backend.seed_manifest(&[remote]);

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.units_pulled, 0);
    assert_eq!(store.get(local.id()).unwrap().note.title, "kept");
    assert_eq!(backend.manifest_units()[0].note.title, "kept");
}

#[tokio::test]
async fn test_tombstoned_unit_is_not_resurrected() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    let deleted = unit_updated_ago("deleted elsewhere", 10);
    store.mark_deleted(deleted.id());
    backend.seed_manifest(&[deleted]);

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.units_pulled, 0);
    assert_eq!(store.len(), 0);
    // The rewritten manifest no longer carries the tombstoned unit.
    assert!(backend.manifest_units().is_empty());
}

#[tokio::test]
async fn test_missing_manifest_means_empty_remote() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.units_pulled, 0);
    assert_eq!(report.units_pushed, 0);
    // Even an empty pass rewrites the manifest.
    assert!(backend.has_file(MANIFEST_PATH));
}

#[tokio::test]
async fn test_pulled_unit_images_are_downloaded() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    backend.seed_manifest(&[with_image(unit_updated_ago("photo note", 5), "cat.png", 7)]);
    backend.insert_file("remote/attachments/cat.png", b"cat png");

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.units_pulled, 1);
    assert_eq!(report.images_downloaded, 1);
    assert_eq!(
        std::fs::read(cache.path().join("cat.png")).unwrap(),
        b"cat png"
    );
}

#[tokio::test]
async fn test_unfetchable_image_is_tolerated() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    // Referenced image exists neither locally nor remotely.
    store.insert(with_image(unit_updated_ago("broken ref", 5), "lost.png", 3));

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.images_downloaded, 0);
    assert_eq!(report.images_uploaded, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.units_pushed, 1);
}

#[tokio::test]
async fn test_remote_orphan_images_are_removed() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    backend.insert_file("remote/attachments/orphan.png", b"old");
    store.insert(unit_updated_ago("no images", 5));

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.images_removed, 1);
    assert!(!backend.has_file("remote/attachments/orphan.png"));
}

#[tokio::test]
async fn test_local_orphan_files_are_removed() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    std::fs::write(cache.path().join("stale.png"), b"stale").unwrap();

    let report = run_sync(&engine, &store, cache.path()).await.expect("sync failed");

    assert_eq!(report.local_files_removed, 1);
    assert!(!cache.path().join("stale.png").exists());
}

#[tokio::test]
async fn test_connect_error_aborts_pass() {
    let backend = MemoryBackend::new();
    let engine = ready_engine(backend.clone());
    let store = MemoryStore::new();
    let cache = tempfile::tempdir().unwrap();

    backend.fail_path(MANIFEST_PATH, OpStatus::ConnectError);
    store.insert(unit_updated_ago("unsynced", 5));

    let err = run_sync(&engine, &store, cache.path()).await.unwrap_err();
    assert_eq!(err.status, OpStatus::ConnectError);
    // Nothing was pushed.
    assert!(!backend.has_file(MANIFEST_PATH));
}
