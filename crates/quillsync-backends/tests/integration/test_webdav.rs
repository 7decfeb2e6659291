//! Integration tests for the WebDAV adapter

use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use quillsync_core::ports::backend::RemoteBackend;
use quillsync_core::status::OpStatus;

use crate::common;

const MULTISTATUS: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/notes/attachments/</d:href>
    <d:propstat>
      <d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/notes/attachments/cat.png</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype/>
        <d:getcontentlength>1234</d:getcontentlength>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/notes/attachments/dog.jpg</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype/>
        <d:getcontentlength>99</d:getcontentlength>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

#[tokio::test]
async fn test_create_dir_sends_mkcol_with_credentials() {
    let (server, backend) = common::setup_webdav().await;

    Mock::given(method("MKCOL"))
        .and(path("/notes/attachments"))
        .and(header("Authorization", "Basic bWU6c2VjcmV0"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    backend
        .create_dir("notes/attachments")
        .await
        .expect("MKCOL failed");
}

#[tokio::test]
async fn test_create_dir_treats_existing_collection_as_success() {
    let (server, backend) = common::setup_webdav().await;

    Mock::given(method("MKCOL"))
        .and(path("/notes/attachments"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    backend
        .create_dir("notes/attachments")
        .await
        .expect("existing collection should be fine");
}

#[tokio::test]
async fn test_create_dir_maps_auth_failure() {
    let (server, backend) = common::setup_webdav().await;

    Mock::given(method("MKCOL"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = backend.create_dir("notes/attachments").await.unwrap_err();
    assert_eq!(err.status, OpStatus::AuthError);
}

#[tokio::test]
async fn test_list_files_parses_multistatus() {
    let (server, backend) = common::setup_webdav().await;

    Mock::given(method("PROPFIND"))
        .and(path("/notes/attachments"))
        .and(header("Depth", "1"))
        .respond_with(
            ResponseTemplate::new(207)
                .insert_header("Content-Type", "application/xml")
                .set_body_string(MULTISTATUS),
        )
        .mount(&server)
        .await;

    let files = backend.list_files("notes/attachments").await.expect("PROPFIND failed");

    // The directory's own entry is dropped from the listing.
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].name, "notes/attachments/cat.png");
    assert_eq!(files[0].size, 1234);
    assert!(!files[0].is_dir);
    assert_eq!(files[1].file_name(), "dog.jpg");
    assert_eq!(files[1].size, 99);
}

#[tokio::test]
async fn test_list_files_decodes_percent_encoded_hrefs() {
    let (server, backend) = common::setup_webdav().await;

    let multistatus = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/notes/attachments/</d:href>
    <d:propstat>
      <d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/notes/attachments/my%20cat.png</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype/>
        <d:getcontentlength>42</d:getcontentlength>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/notes/attachments/100%25.png</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype/>
        <d:getcontentlength>7</d:getcontentlength>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    Mock::given(method("PROPFIND"))
        .and(path("/notes/attachments"))
        .respond_with(
            ResponseTemplate::new(207)
                .insert_header("Content-Type", "application/xml")
                .set_body_string(multistatus),
        )
        .mount(&server)
        .await;

    let files = backend.list_files("notes/attachments").await.expect("PROPFIND failed");

    // Names come back decoded so they compare equal to stored file names.
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].file_name(), "my cat.png");
    assert_eq!(files[0].name, "notes/attachments/my cat.png");
    assert_eq!(files[1].file_name(), "100%.png");
}

#[tokio::test]
async fn test_list_files_missing_dir_maps_to_path_not_found() {
    let (server, backend) = common::setup_webdav().await;

    Mock::given(method("PROPFIND"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = backend.list_files("notes/attachments").await.unwrap_err();
    assert_eq!(err.status, OpStatus::PathNotFound);
}

#[tokio::test]
async fn test_download_file_writes_body_to_disk() {
    let (server, backend) = common::setup_webdav().await;
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("cat.png");

    Mock::given(method("GET"))
        .and(path("/notes/attachments/cat.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png bytes".to_vec()))
        .mount(&server)
        .await;

    let written = backend
        .download_file("notes/attachments/cat.png", &local)
        .await
        .expect("download failed");

    assert_eq!(written, local);
    assert_eq!(std::fs::read(&local).unwrap(), b"png bytes");
}

#[tokio::test]
async fn test_download_missing_file_maps_to_path_not_found() {
    let (server, backend) = common::setup_webdav().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = backend
        .download_file("notes/json/noteCombos.json", &dir.path().join("m.json"))
        .await
        .unwrap_err();
    assert_eq!(err.status, OpStatus::PathNotFound);
}

#[tokio::test]
async fn test_upload_file_puts_bytes_with_content_type() {
    let (server, backend) = common::setup_webdav().await;
    let dir = tempfile::tempdir().unwrap();
    let local = dir.path().join("m.json");
    std::fs::write(&local, b"[]").unwrap();

    Mock::given(method("PUT"))
        .and(path("/notes/json/noteCombos.json"))
        .and(header("Content-Type", "application/json"))
        .and(body_bytes(b"[]".to_vec()))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    backend
        .upload_file(&local, "notes/json/noteCombos.json", "application/json")
        .await
        .expect("upload failed");
}

#[tokio::test]
async fn test_remove_file_tolerates_missing_target() {
    let (server, backend) = common::setup_webdav().await;

    Mock::given(method("DELETE"))
        .and(path("/notes/attachments/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    backend
        .remove_file("notes/attachments/gone.png")
        .await
        .expect("missing target should be fine");
}

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let (server, backend) = common::setup_webdav().await;

    Mock::given(method("MKCOL"))
        .and(path("/notes/attachments"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("MKCOL"))
        .and(path("/notes/attachments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    backend
        .create_dir("notes/attachments")
        .await
        .expect("retry after throttle failed");
}
