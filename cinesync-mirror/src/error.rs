//! Error types for cinesync-mirror
//!
//! Per-record conditions (not found, malformed body) are never errors; they
//! surface as skipped task outcomes. Everything here aborts the run.

use thiserror::Error;

use crate::db::StoreError;
use crate::services::tmdb_client::TmdbError;

/// Fatal run error
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport, HTTP status or decode failure talking to TMDB
    #[error("Remote catalog error: {0}")]
    Remote(#[from] TmdbError),

    /// Staging or canonical store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Reading the operator's answer failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
