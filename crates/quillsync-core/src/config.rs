//! Configuration module for QuillSync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation and defaults. Exactly one backend is
//! active at a time; the others keep their settings but stay disabled.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which remote backend is currently active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// No backend selected; the engine stays disabled
    None,
    /// WebDAV-style server (e.g. Nextcloud)
    Webdav,
    /// SFTP server
    Sftp,
    /// Cloud-file-storage JSON API
    CloudFiles,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BackendKind::None => "none",
            BackendKind::Webdav => "webdav",
            BackendKind::Sftp => "sftp",
            BackendKind::CloudFiles => "cloud_files",
        };
        f.write_str(s)
    }
}

/// Top-level configuration for QuillSync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The active backend selector
    pub backend: BackendKind,
    pub sync: SyncConfig,
    pub webdav: WebdavConfig,
    pub sftp: SftpConfig,
    pub cloud_files: CloudFilesConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory for locally cached image attachments.
    pub image_cache_dir: PathBuf,
    /// Path of the local note store file used by the CLI.
    pub store_file: PathBuf,
}

/// WebDAV connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebdavConfig {
    /// Server URL, e.g. `https://cloud.example.org/remote.php/dav/files/me`.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Remote base directory all QuillSync data lives under.
    pub base_dir: String,
}

/// SFTP connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SftpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Remote base directory all QuillSync data lives under.
    pub base_dir: String,
}

/// Cloud-file-storage API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudFilesConfig {
    /// API root, e.g. `https://api.cloudfiles.example.com/v2`.
    pub api_url: String,
    /// Bearer token for API requests.
    pub access_token: String,
    /// Remote base directory; the API requires a leading `/`.
    pub base_dir: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Save configuration as YAML to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/quillsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("quillsync")
            .join("config.yaml")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::None,
            sync: SyncConfig::default(),
            webdav: WebdavConfig::default(),
            sftp: SftpConfig::default(),
            cloud_files: CloudFilesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("quillsync");
        Self {
            image_cache_dir: data_dir.join("images"),
            store_file: data_dir.join("notes.json"),
        }
    }
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            password: String::new(),
            base_dir: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"webdav.url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Only the active
    /// backend's connection settings are checked.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        match self.backend {
            BackendKind::None => {}
            BackendKind::Webdav => {
                if self.webdav.url.is_empty() {
                    errors.push(ValidationError {
                        field: "webdav.url".into(),
                        message: "must not be empty".into(),
                    });
                }
                if self.webdav.username.is_empty() {
                    errors.push(ValidationError {
                        field: "webdav.username".into(),
                        message: "must not be empty".into(),
                    });
                }
            }
            BackendKind::Sftp => {
                if self.sftp.host.is_empty() {
                    errors.push(ValidationError {
                        field: "sftp.host".into(),
                        message: "must not be empty".into(),
                    });
                }
                if self.sftp.port == 0 {
                    errors.push(ValidationError {
                        field: "sftp.port".into(),
                        message: "must be greater than 0".into(),
                    });
                }
                if self.sftp.username.is_empty() {
                    errors.push(ValidationError {
                        field: "sftp.username".into(),
                        message: "must not be empty".into(),
                    });
                }
            }
            BackendKind::CloudFiles => {
                if self.cloud_files.api_url.is_empty() {
                    errors.push(ValidationError {
                        field: "cloud_files.api_url".into(),
                        message: "must not be empty".into(),
                    });
                }
                if self.cloud_files.access_token.is_empty() {
                    errors.push(ValidationError {
                        field: "cloud_files.access_token".into(),
                        message: "must not be empty".into(),
                    });
                }
                if !self.cloud_files.base_dir.starts_with('/') {
                    errors.push(ValidationError {
                        field: "cloud_files.base_dir".into(),
                        message: "must start with '/'".into(),
                    });
                }
            }
        }

        errors
    }
}
