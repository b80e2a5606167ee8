//! Sync run orchestrator
//!
//! Drives one run through the stage machine in `models::run_state`. The driver
//! loop asks `transition` for the next stage and effect, performs the effect
//! and feeds the resulting event back. Each fetching stage is handled by a
//! dedicated `phase_*` method:
//!
//! - **DIFF_CHECKING**: compare local and remote latest ids
//! - **FETCHING_DETAILS**: reset staged movies, download the new id range
//! - **FETCHING_IMAGES .. FETCHING_CREDITS**: fill one enrichment slot per stage
//! - **FETCHING_PEOPLE**: download people referenced by staged credits
//! - **TRANSFERRING**: promote staged collections to the canonical ones
//!
//! Stage handlers tally their task outcomes in a `StageReport`; the driver folds
//! reports into the run statistics shown at the promotion prompt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::db::Store;
use crate::error::PipelineResult;
use crate::models::{
    transition, CountMismatch, Effect, EntryPoint, Event, RunStats, Stage, StageReport,
    TaskOutcome,
};
use crate::services::prompt::Confirm;
use crate::services::staging_writer::StagingWriter;
use crate::services::tick_scheduler::TickScheduler;
use crate::services::tmdb_client::{CatalogApi, FetchOutcome, ResourceKind};

mod phase_details;
mod phase_diff;
mod phase_enrichment;
mod phase_people;
mod phase_promotion;

pub use phase_diff::{download_question, plan_download, DEFAULT_LOCAL_LATEST_ID};
pub use phase_people::select_people_to_fetch;
pub use phase_promotion::{promote, promotion_question, TransferReport};

/// Longest response excerpt written to the log for a skipped record
const LOGGED_BODY_LIMIT: usize = 200;

/// What a finished run did
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    /// Terminal stage (DONE, EXIT or ERROR)
    pub outcome: Stage,
    pub stats: RunStats,
    pub reports: Vec<StageReport>,
    pub warnings: Vec<CountMismatch>,
    pub transfer: Option<TransferReport>,
    /// Message of the fatal error when `outcome` is ERROR
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.outcome != Stage::Error
    }
}

/// Orchestrates a single sync run
pub struct SyncOrchestrator<C, P> {
    run_id: Uuid,
    api: C,
    store: Store,
    writer: StagingWriter,
    prompt: P,
    scheduler: TickScheduler,
    stats: RunStats,
    reports: Vec<StageReport>,
    warnings: Vec<CountMismatch>,
    transfer: Option<TransferReport>,
}

impl<C, P> SyncOrchestrator<C, P>
where
    C: CatalogApi,
    P: Confirm,
{
    /// Create an orchestrator with fresh statistics
    ///
    /// # Arguments
    /// * `api` - Remote catalog
    /// * `store` - Canonical and staged collections
    /// * `prompt` - Operator confirmation source
    /// * `scheduler` - Tick size and cooldown for batched fetches
    pub fn new(api: C, store: Store, prompt: P, scheduler: TickScheduler) -> Self {
        let writer = StagingWriter::new(&store);
        Self {
            run_id: Uuid::new_v4(),
            api,
            store,
            writer,
            prompt,
            scheduler,
            stats: RunStats::default(),
            reports: Vec::new(),
            warnings: Vec::new(),
            transfer: None,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run until a terminal stage is reached
    pub async fn run(mut self, entry: EntryPoint) -> RunSummary {
        let started_at = Utc::now();
        let (mut stage, mut effect) = entry.initial();
        let mut error = None;

        tracing::info!(
            run_id = %self.run_id,
            entry = ?entry,
            stage = stage.name(),
            "Sync run started"
        );

        while !stage.is_terminal() {
            let event = match self.perform(effect).await {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(run_id = %self.run_id, stage = stage.name(), error = %e, "Stage failed");
                    error = Some(e.to_string());
                    Event::Failed(e.to_string())
                }
            };

            let event_name = event.name();
            let (next, next_effect) = transition(&stage, event);
            if next == Stage::Error && error.is_none() {
                let message = format!("unexpected event '{}' in stage {}", event_name, stage.name());
                tracing::error!(run_id = %self.run_id, "{}", message);
                error = Some(message);
            }

            tracing::info!(
                run_id = %self.run_id,
                from = stage.name(),
                to = next.name(),
                event = event_name,
                "Stage transition"
            );
            stage = next;
            effect = next_effect;
        }

        match stage {
            Stage::Done => tracing::info!(run_id = %self.run_id, stats = ?self.stats, "Sync run complete"),
            Stage::Exit => tracing::info!(run_id = %self.run_id, "Sync run ended by operator"),
            _ => tracing::error!(run_id = %self.run_id, "Sync run aborted"),
        }

        RunSummary {
            run_id: self.run_id,
            outcome: stage,
            stats: self.stats,
            reports: self.reports,
            warnings: self.warnings,
            transfer: self.transfer,
            error,
            started_at,
            ended_at: Utc::now(),
        }
    }

    /// Perform one effect and report what happened
    async fn perform(&mut self, effect: Effect) -> PipelineResult<Event> {
        match effect {
            Effect::CheckDiff => self.phase_diff().await,

            Effect::AskDownload {
                range: _,
                local_latest,
                remote_latest,
            } => {
                let question = download_question(local_latest, remote_latest);
                if self.prompt.confirm(&question).await? {
                    Ok(Event::DownloadConfirmed)
                } else {
                    tracing::info!(run_id = %self.run_id, "Download declined");
                    Ok(Event::Declined)
                }
            }

            Effect::FetchDetails(range) => {
                let (report, mismatch) = self.phase_details(range).await?;
                self.record(report);
                self.warnings.extend(mismatch);
                Ok(Event::DetailsDownloaded)
            }

            Effect::FetchSlot(slot) => {
                let report = self.phase_enrichment(slot).await?;
                self.record(report);
                Ok(Event::SlotDownloaded(slot))
            }

            Effect::FetchPeople => {
                let report = self.phase_people().await?;
                self.record(report);
                Ok(Event::PeopleDownloaded)
            }

            Effect::AskPromotion => {
                let question = promotion_question(&self.stats, &self.store);
                if self.prompt.confirm(&question).await? {
                    Ok(Event::PromotionConfirmed)
                } else {
                    tracing::info!(
                        run_id = %self.run_id,
                        "Promotion declined; staged data kept, run again with --transfer-data to promote it"
                    );
                    Ok(Event::Declined)
                }
            }

            Effect::Transfer => {
                let report = promote(&self.store).await?;
                self.transfer = Some(report);
                Ok(Event::Transferred)
            }

            Effect::Halt => Ok(Event::Failed("halt requested in a working stage".to_string())),
        }
    }

    fn record(&mut self, report: StageReport) {
        tracing::info!(
            run_id = %self.run_id,
            artifact = report.artifact.as_str(),
            attempted = report.attempted,
            written = report.written,
            not_found = report.not_found,
            malformed = report.malformed,
            "Stage finished"
        );
        self.stats.absorb(&report);
        self.reports.push(report);
    }

    /// Body of a found resource, or the skip outcome once it is logged
    fn found_or_skip(
        &self,
        kind: ResourceKind,
        id: i64,
        outcome: FetchOutcome,
    ) -> Result<Value, TaskOutcome> {
        match outcome {
            FetchOutcome::Found(body) => Ok(body),
            FetchOutcome::NotFound => {
                tracing::warn!(
                    run_id = %self.run_id,
                    kind = kind.as_str(),
                    id,
                    "Resource not found upstream, skipping"
                );
                Err(TaskOutcome::NotFound)
            }
            FetchOutcome::Malformed(body) => {
                let mut excerpt = body.to_string();
                if excerpt.len() > LOGGED_BODY_LIMIT {
                    let mut cut = LOGGED_BODY_LIMIT;
                    while !excerpt.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    excerpt.truncate(cut);
                }
                tracing::warn!(
                    run_id = %self.run_id,
                    kind = kind.as_str(),
                    id,
                    missing = kind.identity_field(),
                    body = %excerpt,
                    "Malformed response, skipping"
                );
                Err(TaskOutcome::Malformed)
            }
        }
    }
}
