//! SFTP backend adapter
//!
//! libssh2 (via the `ssh2` crate) is a blocking API, so every remote
//! operation runs on the blocking thread pool. The authenticated
//! session is cached and reused; a network-level failure drops it so
//! the next operation reconnects.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ssh2::{ErrorCode, Session};
use tracing::debug;

use quillsync_core::config::SftpConfig;
use quillsync_core::ports::backend::{RemoteBackend, RemoteFile};
use quillsync_core::status::{OpStatus, TaskError, TaskResult};

// libssh2 SFTP status codes we care about
const SFTP_NO_SUCH_FILE: i32 = 2;
const SFTP_PERMISSION_DENIED: i32 = 3;

/// SFTP implementation of [`RemoteBackend`]
pub struct SftpBackend {
    inner: Arc<Inner>,
}

struct Inner {
    config: SftpConfig,
    base_dir: String,
    session: Mutex<Option<Session>>,
}

impl SftpBackend {
    /// Creates an adapter from connection settings; connects lazily
    pub fn new(config: &SftpConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: config.clone(),
                base_dir: config.base_dir.trim_end_matches('/').to_string(),
                session: Mutex::new(None),
            }),
        }
    }

    /// Runs a blocking SFTP closure on the blocking pool
    async fn run<T, F>(&self, f: F) -> TaskResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ssh2::Sftp) -> TaskResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let session = inner.session()?;
            let sftp = session.sftp().map_err(map_ssh_error)?;
            let out = f(&sftp);
            if let Err(err) = &out {
                if err.status.is_network_error() {
                    inner.invalidate();
                }
            }
            out
        })
        .await
        .map_err(|e| TaskError::other(format!("sftp worker failed: {e}")))?
    }
}

impl Inner {
    /// Returns the cached session, connecting if none is alive
    fn session(&self) -> TaskResult<Session> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| TaskError::other("sftp session lock poisoned"))?;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }
        let session = self.connect()?;
        *guard = Some(session.clone());
        Ok(session)
    }

    fn connect(&self) -> TaskResult<Session> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let stream = TcpStream::connect(&addr).map_err(|e| map_connect_error(&addr, &e))?;

        let mut session = Session::new().map_err(map_ssh_error)?;
        session.set_tcp_stream(stream);
        session.handshake().map_err(|e| {
            TaskError::new(OpStatus::ConnectError, format!("ssh handshake with {addr}: {e}"))
        })?;
        session
            .userauth_password(&self.config.username, &self.config.password)
            .map_err(|e| {
                TaskError::new(
                    OpStatus::AuthError,
                    format!("authentication for {} failed: {e}", self.config.username),
                )
            })?;

        debug!(host = %self.config.host, port = self.config.port, "sftp session established");
        Ok(session)
    }

    /// Drops the cached session so the next operation reconnects
    fn invalidate(&self) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = None;
        }
    }
}

/// Maps a TCP connect failure onto the shared taxonomy
fn map_connect_error(addr: &str, err: &std::io::Error) -> TaskError {
    let detail = err.to_string().to_lowercase();
    let status = if detail.contains("lookup") || detail.contains("resolve") || detail.contains("dns")
    {
        OpStatus::UnknownHost
    } else {
        OpStatus::ConnectError
    };
    TaskError::new(status, format!("connecting to {addr}: {err}"))
}

/// Maps a libssh2 error onto the shared taxonomy
fn map_ssh_error(err: ssh2::Error) -> TaskError {
    let status = match err.code() {
        ErrorCode::SFTP(SFTP_NO_SUCH_FILE) => OpStatus::PathNotFound,
        ErrorCode::SFTP(SFTP_PERMISSION_DENIED) => OpStatus::AuthError,
        ErrorCode::SFTP(_) => OpStatus::OtherError,
        // Session-level failures mean the transport is gone.
        ErrorCode::Session(_) => OpStatus::ConnectError,
    };
    TaskError::new(status, err.to_string())
}

#[async_trait::async_trait]
impl RemoteBackend for SftpBackend {
    async fn create_dir(&self, path: &str) -> TaskResult<()> {
        let path = path.to_string();
        self.run(move |sftp| {
            let remote = Path::new(&path);
            match sftp.mkdir(remote, 0o755) {
                Ok(()) => Ok(()),
                Err(err) => {
                    // Servers report an existing directory in different
                    // ways; a stat that finds a directory settles it.
                    if let Ok(stat) = sftp.stat(remote) {
                        if stat.is_dir() {
                            return Ok(());
                        }
                    }
                    Err(map_ssh_error(err))
                }
            }
        })
        .await
    }

    async fn list_files(&self, dir: &str) -> TaskResult<Vec<RemoteFile>> {
        let dir = dir.to_string();
        self.run(move |sftp| {
            let entries = sftp.readdir(Path::new(&dir)).map_err(map_ssh_error)?;
            Ok(entries
                .into_iter()
                .map(|(path, stat)| RemoteFile {
                    name: path.to_string_lossy().into_owned(),
                    size: stat.size.unwrap_or(0),
                    is_dir: stat.is_dir(),
                })
                .collect())
        })
        .await
    }

    async fn download_file(&self, remote: &str, local: &Path) -> TaskResult<PathBuf> {
        let remote = remote.to_string();
        let local = local.to_path_buf();
        self.run(move |sftp| {
            let mut file = sftp.open(Path::new(&remote)).map_err(map_ssh_error)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| TaskError::other(format!("reading {remote}: {e}")))?;
            std::fs::write(&local, &data)
                .map_err(|e| TaskError::other(format!("writing {}: {e}", local.display())))?;
            debug!(remote, bytes = data.len(), "downloaded");
            Ok(local)
        })
        .await
    }

    async fn upload_file(&self, local: &Path, remote: &str, _mime_type: &str) -> TaskResult<()> {
        let remote = remote.to_string();
        let local = local.to_path_buf();
        self.run(move |sftp| {
            let data = std::fs::read(&local)
                .map_err(|e| TaskError::other(format!("reading {}: {e}", local.display())))?;
            let mut file = sftp.create(Path::new(&remote)).map_err(map_ssh_error)?;
            file.write_all(&data)
                .map_err(|e| TaskError::other(format!("writing {remote}: {e}")))?;
            debug!(remote, bytes = data.len(), "uploaded");
            Ok(())
        })
        .await
    }

    async fn remove_file(&self, remote: &str) -> TaskResult<()> {
        let remote = remote.to_string();
        self.run(move |sftp| match sftp.unlink(Path::new(&remote)) {
            Ok(()) => Ok(()),
            Err(err) => match map_ssh_error(err) {
                // Already gone: absence is the intended end state.
                e if e.status == OpStatus::PathNotFound => Ok(()),
                e => Err(e),
            },
        })
        .await
    }

    fn absolute_path(&self, segments: &[&str]) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if !self.inner.base_dir.is_empty() {
            parts.push(&self.inner.base_dir);
        }
        parts.extend(segments.iter().copied());
        parts.join("/")
    }
}
