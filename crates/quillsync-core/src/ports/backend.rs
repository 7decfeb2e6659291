//! Remote backend port (driven/secondary port)
//!
//! One uniform contract over a concrete remote storage backend. The engine
//! crate layers readiness gating and throttling on top of this trait; the
//! adapters in `quillsync-backends` implement it for WebDAV, SFTP, and a
//! cloud-file-storage API.
//!
//! ## Design Notes
//!
//! - Returns [`TaskResult`] rather than `anyhow::Result`: adapters must
//!   converge on the shared [`OpStatus`](crate::status::OpStatus) taxonomy,
//!   so classification happens at this boundary, not above it.
//! - Rate-limited backends retry internally (bounded backoff) before
//!   surfacing any error; callers never retry.
//! - Every method is a suspension point; adapters own their timeouts.

use std::path::{Path, PathBuf};

use crate::status::TaskResult;

/// One entry of a remote directory listing
///
/// Purely descriptive; produced by [`RemoteBackend::list_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Full remote path of the entry
    pub name: String,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

impl RemoteFile {
    /// The final path segment of the entry
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Port trait for remote storage backends
///
/// ## Implementation Notes
///
/// - `create_dir` is idempotent: a backend's "already exists" response must
///   be normalized to success.
/// - `remove_file` treats "not found" as success, since the end state
///   (absence) matches intent.
/// - `download_file` writes to the staging path it is given and maps a
///   missing remote file to `PathNotFound`, never `OtherError`.
#[async_trait::async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Creates a remote directory, succeeding if it already exists
    async fn create_dir(&self, path: &str) -> TaskResult<()>;

    /// Lists the entries of a remote directory
    ///
    /// A non-existent directory maps to `PathNotFound`.
    async fn list_files(&self, dir: &str) -> TaskResult<Vec<RemoteFile>>;

    /// Downloads a remote file to the given local staging path
    ///
    /// Returns the local path written. A missing remote file maps to
    /// `PathNotFound`.
    async fn download_file(&self, remote: &str, local: &Path) -> TaskResult<PathBuf>;

    /// Uploads a local file to the given remote path
    async fn upload_file(&self, local: &Path, remote: &str, mime_type: &str) -> TaskResult<()>;

    /// Removes a remote file; absence counts as success
    async fn remove_file(&self, remote: &str) -> TaskResult<()>;

    /// Joins the configured base directory with path segments
    ///
    /// Backend-specific: the cloud-files API requires a leading `/`, WebDAV
    /// prepends the user-configured base directory.
    fn absolute_path(&self, segments: &[&str]) -> String;
}
