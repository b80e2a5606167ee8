//! Service modules for the sync pipeline
//!
//! - TMDB client behind the `CatalogApi` seam
//! - Tick scheduler bounding the request rate
//! - Staging writer and operator prompt
//! - Orchestrator driving a run through its stages

pub mod prompt;
pub mod staging_writer;
pub mod sync_orchestrator;
pub mod tick_scheduler;
pub mod tmdb_client;

pub use prompt::{Confirm, StdinPrompt};
pub use staging_writer::StagingWriter;
pub use sync_orchestrator::{RunSummary, SyncOrchestrator, TransferReport};
pub use tick_scheduler::TickScheduler;
pub use tmdb_client::{CatalogApi, FetchOutcome, ResourceKind, TmdbClient, TmdbError};
