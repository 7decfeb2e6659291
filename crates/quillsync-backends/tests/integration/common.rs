//! Shared test helpers for backend integration tests
//!
//! Each helper starts a wiremock server and returns it together with
//! an adapter pointed at it. Mocks are mounted by the individual tests.

use wiremock::MockServer;

use quillsync_backends::cloudfiles::CloudFilesBackend;
use quillsync_backends::webdav::WebdavBackend;
use quillsync_core::config::{CloudFilesConfig, WebdavConfig};

/// Starts a mock WebDAV server and an adapter pointed at it
pub async fn setup_webdav() -> (MockServer, WebdavBackend) {
    let server = MockServer::start().await;
    let backend = WebdavBackend::new(&WebdavConfig {
        url: server.uri(),
        username: "me".into(),
        password: "secret".into(),
        base_dir: "notes".into(),
    })
    .expect("webdav backend");
    (server, backend)
}

/// Starts a mock Cloud Files API server and an adapter pointed at it
pub async fn setup_cloudfiles() -> (MockServer, CloudFilesBackend) {
    let server = MockServer::start().await;
    let backend = CloudFilesBackend::new(&CloudFilesConfig {
        api_url: server.uri(),
        access_token: "test-token".into(),
        base_dir: "/notes".into(),
    })
    .expect("cloudfiles backend");
    (server, backend)
}
