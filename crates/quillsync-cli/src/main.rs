//! QuillSync CLI
//!
//! Thin driver around the sync engine:
//! - `test` probes the configured remote
//! - `sync` runs a full reconciliation pass
//! - `config` shows and validates the configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod store;

use commands::{config::ConfigCommand, sync::SyncCommand, test::TestCommand};

#[derive(Debug, Parser)]
#[command(name = "quillsync", version, about = "Note synchronization over WebDAV, SFTP or cloud file storage")]
pub struct Cli {
    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Probe the configured remote without transferring any data
    Test(TestCommand),
    /// Run one full reconciliation pass
    Sync(SyncCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Test(cmd) => cmd.execute(cli.config.as_deref()).await,
        Commands::Sync(cmd) => cmd.execute(cli.config.as_deref()).await,
        Commands::Config(cmd) => cmd.execute(cli.config.as_deref()).await,
    }
}
