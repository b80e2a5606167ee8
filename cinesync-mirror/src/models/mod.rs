//! Data models for cinesync-mirror
//!
//! - Staged record types (movies, people) as stored in the document collections
//! - Run state machine (stages, events, entry points)
//! - Run statistics

pub mod movie;
pub mod person;
pub mod run_state;
pub mod run_stats;

pub use movie::{CreditRef, Credits, EnrichmentSlot, Movie};
pub use person::Person;
pub use run_state::{transition, Effect, EntryPoint, Event, IdRange, Stage, Step};
pub use run_stats::{Artifact, CountMismatch, RunStats, StageReport, TaskOutcome};

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept `YYYY-MM-DD`; anything else (empty string, null, garbage) is absent
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    })
}
