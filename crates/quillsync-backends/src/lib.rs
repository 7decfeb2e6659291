//! QuillSync Backends - concrete remote storage adapters
//!
//! Three interchangeable implementations of the
//! [`RemoteBackend`](quillsync_core::ports::backend::RemoteBackend) port:
//!
//! - [`webdav::WebdavBackend`] - WebDAV servers (MKCOL/PROPFIND/GET/PUT/DELETE)
//! - [`sftp::SftpBackend`] - SFTP servers via libssh2 on a blocking executor
//! - [`cloudfiles::CloudFilesBackend`] - a cloud-file-storage JSON API
//!
//! Each adapter owns the mapping from its native errors into the shared
//! [`OpStatus`](quillsync_core::status::OpStatus) taxonomy, and retries
//! rate-limited requests internally before surfacing anything to the task
//! layer.

pub mod cloudfiles;
mod http;
pub mod retry;
pub mod sftp;
pub mod webdav;

use std::sync::Arc;

use quillsync_core::config::{BackendKind, Config};
use quillsync_core::ports::backend::RemoteBackend;

/// Builds the backend selected in the configuration
///
/// Returns an error for `BackendKind::None`; callers should treat that as
/// "engine disabled" rather than constructing anything.
pub fn backend_from_config(config: &Config) -> anyhow::Result<Arc<dyn RemoteBackend>> {
    match config.backend {
        BackendKind::Webdav => Ok(Arc::new(webdav::WebdavBackend::new(&config.webdav)?)),
        BackendKind::Sftp => Ok(Arc::new(sftp::SftpBackend::new(&config.sftp))),
        BackendKind::CloudFiles => Ok(Arc::new(cloudfiles::CloudFilesBackend::new(
            &config.cloud_files,
        )?)),
        BackendKind::None => anyhow::bail!("no backend selected"),
    }
}
