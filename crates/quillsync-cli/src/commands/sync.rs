//! `quillsync sync` - run one full reconciliation pass

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use quillsync_engine::run_probe;
use quillsync_sync::run_sync;

use super::{build_engine, load_config};
use crate::store::JsonFileStore;

#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, config_override: Option<&Path>) -> Result<()> {
        let (path, config) = load_config(config_override)?;
        info!(config = %path.display(), backend = ?config.backend, "starting sync");

        let engine = build_engine(&config)?;

        // Reconciliation only runs against a probed remote.
        let probe = run_probe(&engine).await;
        if !probe.is_success() {
            let detail = probe
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown failure".to_string());
            bail!("remote is not reachable: {detail}");
        }

        let store = JsonFileStore::open(&config.sync.store_file)
            .await
            .with_context(|| {
                format!("opening note store {}", config.sync.store_file.display())
            })?;

        let report = run_sync(&engine, &store, &config.sync.image_cache_dir)
            .await
            .map_err(|e| anyhow::anyhow!("sync pass failed: {e}"))?;

        println!(
            "sync finished in {} ms: {} pulled, {} pushed, {} images down, {} up, {} removed",
            report.duration_ms,
            report.units_pulled,
            report.units_pushed,
            report.images_downloaded,
            report.images_uploaded,
            report.images_removed
        );
        for problem in &report.errors {
            eprintln!("warning: {problem}");
        }
        Ok(())
    }
}
