//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use quillsync_backends::backend_from_config;
use quillsync_core::config::Config;
use quillsync_core::status::EngineStatus;
use quillsync_engine::Engine;

pub mod config;
pub mod sync;

/// Resolves the config file path and loads it
pub(crate) fn load_config(override_path: Option<&Path>) -> Result<(PathBuf, Config)> {
    let path = override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);
    let config = Config::load(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    Ok((path, config))
}

/// Builds an engine for the configured backend, refusing an invalid config
pub(crate) fn build_engine(config: &Config) -> Result<Arc<Engine>> {
    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("config error: {}: {}", problem.field, problem.message);
        }
        bail!("configuration is not valid");
    }
    let backend = backend_from_config(config)?;
    Ok(Arc::new(Engine::new(backend, EngineStatus::Ready)))
}
