//! cinesync-mirror - TMDB batch mirror
//!
//! Downloads movies published on TMDB since the newest locally known id,
//! enriches them, collects the people they credit and, once the operator
//! agrees, promotes everything to the canonical collections.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cinesync_common::config::SyncConfig;
use cinesync_mirror::models::{EntryPoint, Step};

/// Command-line arguments for cinesync-mirror
#[derive(Parser, Debug)]
#[command(name = "cinesync-mirror")]
#[command(about = "Mirror new TMDB movies and people into a local store")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only promote already staged data to the main collections
    #[arg(short, long)]
    transfer_data: bool,

    /// Resume at this stage using what is already staged
    #[arg(short, long, value_enum)]
    step: Option<Step>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = SyncConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    cinesync_common::logging::init(&config.logging).context("Failed to initialize logging")?;

    info!(
        "Starting cinesync-mirror v{} ({}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let entry = EntryPoint::from_flags(args.transfer_data, args.step);
    let summary = cinesync_mirror::run_sync(&config, entry).await?;

    for warning in &summary.warnings {
        tracing::warn!(
            expected = warning.expected,
            actual = warning.actual,
            "Staged movie count differs from the requested range"
        );
    }

    if !summary.succeeded() {
        anyhow::bail!(
            "Sync run {} failed: {}",
            summary.run_id,
            summary.error.as_deref().unwrap_or("unknown error")
        );
    }

    info!(run_id = %summary.run_id, outcome = summary.outcome.name(), "Exiting");
    Ok(())
}
