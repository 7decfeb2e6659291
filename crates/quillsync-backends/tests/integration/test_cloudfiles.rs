//! Integration tests for the Cloud Files adapter

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use quillsync_core::ports::backend::RemoteBackend;
use quillsync_core::status::OpStatus;

use crate::common;

#[tokio::test]
async fn test_create_dir_posts_path_with_bearer_token() {
    let (server, backend) = common::setup_cloudfiles().await;

    Mock::given(method("POST"))
        .and(path("/files/create_folder"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(serde_json::json!({"path": "/notes/attachments"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    backend
        .create_dir("/notes/attachments")
        .await
        .expect("create_folder failed");
}

#[tokio::test]
async fn test_create_dir_treats_conflict_as_success() {
    let (server, backend) = common::setup_cloudfiles().await;

    Mock::given(method("POST"))
        .and(path("/files/create_folder"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    backend
        .create_dir("/notes/attachments")
        .await
        .expect("existing folder should be fine");
}

#[tokio::test]
async fn test_list_files_decodes_entries() {
    let (server, backend) = common::setup_cloudfiles().await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .and(body_json(serde_json::json!({"path": "/notes/attachments"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "entries": [
                {".tag": "folder", "pathDisplay": "/notes/attachments/sub"},
                {".tag": "file", "pathDisplay": "/notes/attachments/cat.png", "size": 1234}
            ]
        })))
        .mount(&server)
        .await;

    let files = backend
        .list_files("/notes/attachments")
        .await
        .expect("list_folder failed");

    assert_eq!(files.len(), 2);
    assert!(files[0].is_dir);
    assert!(!files[1].is_dir);
    assert_eq!(files[1].file_name(), "cat.png");
    assert_eq!(files[1].size, 1234);
}

#[tokio::test]
async fn test_list_files_missing_folder_maps_to_path_not_found() {
    let (server, backend) = common::setup_cloudfiles().await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = backend.list_files("/notes/attachments").await.unwrap_err();
    assert_eq!(err.status, OpStatus::PathNotFound);
}

#[tokio::test]
async fn test_download_file_writes_body_to_disk() {
    let (server, backend) = common::setup_cloudfiles().await;
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("cat.png");

    Mock::given(method("POST"))
        .and(path("/files/download"))
        .and(body_json(serde_json::json!({"path": "/notes/attachments/cat.png"})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png bytes".to_vec()))
        .mount(&server)
        .await;

    let written = backend
        .download_file("/notes/attachments/cat.png", &local)
        .await
        .expect("download failed");

    assert_eq!(written, local);
    assert_eq!(std::fs::read(&local).unwrap(), b"png bytes");
}

#[tokio::test]
async fn test_upload_file_sends_path_header_and_body() {
    let (server, backend) = common::setup_cloudfiles().await;
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("cat.png");
    std::fs::write(&local, b"png bytes").unwrap();

    Mock::given(method("POST"))
        .and(path("/files/upload"))
        .and(header("X-File-Path", "/notes/attachments/cat.png"))
        .and(header("Content-Type", "image/png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    backend
        .upload_file(&local, "/notes/attachments/cat.png", "image/png")
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_remove_file_tolerates_missing_target() {
    let (server, backend) = common::setup_cloudfiles().await;

    Mock::given(method("POST"))
        .and(path("/files/delete"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    backend
        .remove_file("/notes/attachments/gone.png")
        .await
        .expect("missing target should be fine");
}

#[tokio::test]
async fn test_auth_failure_maps_to_auth_error() {
    let (server, backend) = common::setup_cloudfiles().await;

    Mock::given(method("POST"))
        .and(path("/files/list_folder"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = backend.list_files("/notes/attachments").await.unwrap_err();
    assert_eq!(err.status, OpStatus::AuthError);
}
