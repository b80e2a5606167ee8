//! cinesync-mirror library interface
//!
//! Mirrors newly published TMDB movies, their enrichment data and the people
//! they credit into staging collections, then promotes them to the canonical
//! collections once the operator agrees.

pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{PipelineError, PipelineResult};

use cinesync_common::config::SyncConfig;

use crate::db::{init_database_pool, Store};
use crate::models::EntryPoint;
use crate::services::{RunSummary, StdinPrompt, SyncOrchestrator, TickScheduler, TmdbClient};

/// Wire the production client, store and stdin prompt, then run
pub async fn run_sync(config: &SyncConfig, entry: EntryPoint) -> anyhow::Result<RunSummary> {
    let pool = init_database_pool(&config.database_url).await?;
    let store = Store::open(&pool, &config.collections).await?;
    let api = TmdbClient::new(&config.tmdb)?;
    let scheduler = TickScheduler::from_settings(&config.scheduler);

    tracing::info!(
        requests_per_tick = scheduler.per_tick(),
        tick_interval_ms = scheduler.cooldown().as_millis() as u64,
        "Scheduler configured"
    );

    let orchestrator = SyncOrchestrator::new(api, store, StdinPrompt::new(), scheduler);
    let summary = orchestrator.run(entry).await;

    pool.close().await;
    Ok(summary)
}
