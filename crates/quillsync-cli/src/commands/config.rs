//! `quillsync config` - view and validate configuration

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use quillsync_core::config::Config;

use super::load_config;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, config_override: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(config_override),
            ConfigCommand::Validate => self.execute_validate(config_override),
        }
    }

    fn execute_show(&self, config_override: Option<&Path>) -> Result<()> {
        let path = config_override
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::default_path);
        let config = redacted(Config::load_or_default(&path));

        println!("# {}", path.display());
        let yaml = serde_yaml::to_string(&config).context("serializing configuration")?;
        print!("{yaml}");
        Ok(())
    }

    fn execute_validate(&self, config_override: Option<&Path>) -> Result<()> {
        let (path, config) = load_config(config_override)?;
        let problems = config.validate();
        if problems.is_empty() {
            println!("{}: ok", path.display());
            Ok(())
        } else {
            for problem in &problems {
                eprintln!("{}: {}", problem.field, problem.message);
            }
            bail!("{} problem(s) in {}", problems.len(), path.display());
        }
    }
}

/// Blanks out credentials before the config is printed
fn redacted(mut config: Config) -> Config {
    for secret in [
        &mut config.webdav.password,
        &mut config.sftp.password,
        &mut config.cloud_files.access_token,
    ] {
        if !secret.is_empty() {
            *secret = "<redacted>".to_string();
        }
    }
    config
}
