//! FETCHING_DETAILS: download the new id range into the staged movies

use super::SyncOrchestrator;
use crate::error::PipelineResult;
use crate::models::{Artifact, CountMismatch, IdRange, Movie, StageReport, TaskOutcome};
use crate::services::prompt::Confirm;
use crate::services::tmdb_client::{CatalogApi, ResourceKind};

/// Compare the staged count with the number of ids requested
pub fn check_staged_count(range: IdRange, staged: u64) -> Option<CountMismatch> {
    let expected = range.len();
    (staged != expected).then_some(CountMismatch {
        expected,
        actual: staged,
    })
}

impl<C, P> SyncOrchestrator<C, P>
where
    C: CatalogApi,
    P: Confirm,
{
    /// Reset both staging collections and fetch every id in `range`
    ///
    /// A staged count below the range size is reported, not treated as fatal.
    pub(super) async fn phase_details(
        &self,
        range: IdRange,
    ) -> PipelineResult<(StageReport, Option<CountMismatch>)> {
        self.writer.reset_movies().await?;
        self.writer.reset_people().await?;

        tracing::info!(
            run_id = %self.run_id,
            start = range.start,
            end = range.end,
            total = range.len(),
            "Downloading movie details"
        );

        let tasks: Vec<_> = range.ids().map(|id| self.fetch_movie(id, range.end)).collect();
        let outcomes = self.scheduler.run(self.scheduler.partition(tasks)).await?;
        let report = StageReport::from_outcomes(Artifact::Movies, &outcomes);

        let staged = self.store.staged_movies.count().await?;
        let mismatch = check_staged_count(range, staged);
        if let Some(m) = &mismatch {
            tracing::warn!(
                run_id = %self.run_id,
                "Expected {} movies to be saved, but only {} were saved!",
                m.expected,
                m.actual
            );
        }

        Ok((report, mismatch))
    }

    async fn fetch_movie(&self, id: i64, end_id: i64) -> PipelineResult<TaskOutcome> {
        tracing::info!(run_id = %self.run_id, "{}/{} Downloading...", id, end_id);

        let outcome = self.api.fetch(ResourceKind::Movie, id).await?;
        let body = match self.found_or_skip(ResourceKind::Movie, id, outcome) {
            Ok(body) => body,
            Err(skipped) => return Ok(skipped),
        };

        let movie: Movie = match serde_json::from_value(body) {
            Ok(movie) => movie,
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, id, error = %e, "Movie does not match schema, skipping");
                return Ok(TaskOutcome::Malformed);
            }
        };

        self.writer.write_detail(&movie).await?;
        tracing::info!(
            run_id = %self.run_id,
            "{}/{}: Inserted '{}' in db.",
            id,
            end_id,
            movie.title.as_deref().unwrap_or("untitled")
        );
        Ok(TaskOutcome::Written)
    }
}
