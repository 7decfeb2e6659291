//! The engine: one uniform, gated contract over a remote backend
//!
//! An [`Engine`] owns a [`RemoteBackend`] adapter, the readiness level all
//! tasks gate on, and the shared non-meta concurrency budget. Readiness is
//! mutated only through the named transition methods here, never from
//! unrelated call sites.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use quillsync_core::ports::backend::{RemoteBackend, RemoteFile};
use quillsync_core::status::{EngineStatus, TaskError, TaskResult};

use crate::gate::Gate;

/// Uniform contract over a concrete remote backend
///
/// The primitives are thin wrappers over the backend adapter; gating and
/// throttling live in the task layer ([`Task`](crate::task::Task)), which
/// consults this engine's gate before running.
pub struct Engine {
    backend: Arc<dyn RemoteBackend>,
    gate: Gate,
}

impl Engine {
    /// Creates an engine over the given backend at the given initial level
    pub fn new(backend: Arc<dyn RemoteBackend>, initial: EngineStatus) -> Self {
        Self {
            backend,
            gate: Gate::new(initial),
        }
    }

    pub(crate) fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Current readiness level
    pub fn status(&self) -> EngineStatus {
        self.gate.status()
    }

    /// Subscribes to readiness changes
    pub fn status_changes(&self) -> watch::Receiver<EngineStatus> {
        self.gate.subscribe_status()
    }

    /// Number of non-meta tasks currently running
    pub fn running_operations(&self) -> usize {
        self.gate.running()
    }

    // ========================================================================
    // Status transitions
    // ========================================================================

    /// Preference change: this backend was selected or deselected
    pub fn set_enabled(&self, enabled: bool) {
        let status = if enabled {
            EngineStatus::Ready
        } else {
            EngineStatus::Disabled
        };
        info!(%status, "engine enablement changed");
        self.gate.set_status(status);
    }

    /// Connection settings changed; previous probe results no longer hold
    pub fn on_credentials_changed(&self) {
        info!("credentials changed, resetting to ready");
        self.gate.set_status(EngineStatus::Ready);
    }

    /// Claims the probe slot: flips to Testing iff the current level is
    /// above Testing.
    ///
    /// Returns false when a probe is already running or the engine is
    /// disabled, preventing concurrent self-tests.
    pub(crate) fn begin_probe(&self) -> bool {
        self.gate
            .set_status_if(|s| s > EngineStatus::Testing, EngineStatus::Testing)
    }

    /// Probe finished; map its outcome onto the readiness level
    pub(crate) fn on_probe_completed(&self, status: EngineStatus) {
        info!(%status, "probe completed");
        self.gate.set_status(status);
    }

    // ========================================================================
    // Remote primitives
    // ========================================================================

    /// Creates a remote directory; succeeds if it already exists
    pub async fn create_dir(&self, path: &str) -> TaskResult<()> {
        debug!(path, "create_dir");
        self.backend.create_dir(path).await
    }

    /// Lists a remote directory, keeping only entries the filter accepts
    pub async fn list_files<F>(&self, dir: &str, filter: F) -> TaskResult<Vec<RemoteFile>>
    where
        F: Fn(&RemoteFile) -> bool,
    {
        let files = self.backend.list_files(dir).await?;
        let kept: Vec<RemoteFile> = files.into_iter().filter(|f| filter(f)).collect();
        debug!(dir, kept = kept.len(), "list_files");
        Ok(kept)
    }

    /// Downloads a remote file into the given staging path
    pub async fn download_file(&self, remote: &str, local: &Path) -> TaskResult<PathBuf> {
        debug!(remote, local = %local.display(), "download_file");
        self.backend.download_file(remote, local).await
    }

    /// Uploads a local file to the given remote path
    ///
    /// Fails fast with `OtherError` when the local file does not exist,
    /// before any network call.
    pub async fn upload_file(&self, local: &Path, remote: &str, mime_type: &str) -> TaskResult<()> {
        if !local.is_file() {
            return Err(TaskError::other(format!(
                "local file does not exist: {}",
                local.display()
            )));
        }
        debug!(remote, local = %local.display(), mime_type, "upload_file");
        self.backend.upload_file(local, remote, mime_type).await
    }

    /// Removes a remote file; absence counts as success
    pub async fn remove_file(&self, remote: &str) -> TaskResult<()> {
        debug!(remote, "remove_file");
        self.backend.remove_file(remote).await
    }

    /// Joins the backend's base directory with path segments
    pub fn absolute_path(&self, segments: &[&str]) -> String {
        self.backend.absolute_path(segments)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("status", &self.status())
            .field("running_operations", &self.running_operations())
            .finish()
    }
}
