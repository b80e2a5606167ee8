//! FETCHING_IMAGES .. FETCHING_CREDITS: fill one enrichment slot of every staged movie

use futures::TryStreamExt;

use super::SyncOrchestrator;
use crate::error::PipelineResult;
use crate::models::{EnrichmentSlot, StageReport, TaskOutcome};
use crate::services::prompt::Confirm;
use crate::services::tmdb_client::{CatalogApi, ResourceKind};

impl<C, P> SyncOrchestrator<C, P>
where
    C: CatalogApi,
    P: Confirm,
{
    pub(super) async fn phase_enrichment(&self, slot: EnrichmentSlot) -> PipelineResult<StageReport> {
        let ids: Vec<i64> = self.store.staged_movies.stream_ids().try_collect().await?;
        let total = ids.len();

        tracing::info!(
            run_id = %self.run_id,
            "Found {} movie ids in db. Starting to download {}...",
            total,
            slot
        );

        let tasks: Vec<_> = ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| self.fetch_slot(slot, id, index + 1, total))
            .collect();
        let outcomes = self.scheduler.run(self.scheduler.partition(tasks)).await?;

        Ok(StageReport::from_outcomes(slot.artifact(), &outcomes))
    }

    async fn fetch_slot(
        &self,
        slot: EnrichmentSlot,
        movie_id: i64,
        position: usize,
        total: usize,
    ) -> PipelineResult<TaskOutcome> {
        let kind = ResourceKind::from(slot);
        tracing::debug!(run_id = %self.run_id, movie_id, "{}/{} Downloading {}...", position, total, slot);

        let outcome = self.api.fetch(kind, movie_id).await?;
        let body = match self.found_or_skip(kind, movie_id, outcome) {
            Ok(body) => body,
            Err(skipped) => return Ok(skipped),
        };

        self.writer
            .write_field(movie_id, slot, &kind.into_payload(body))
            .await?;
        tracing::info!(run_id = %self.run_id, movie_id, "{}/{}: Saved {}.", position, total, slot);
        Ok(TaskOutcome::Written)
    }
}
