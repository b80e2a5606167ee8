//! FETCHING_PEOPLE: download people referenced by staged credits

use futures::TryStreamExt;
use std::collections::HashSet;

use super::SyncOrchestrator;
use crate::error::PipelineResult;
use crate::models::{Artifact, Credits, Person, StageReport, TaskOutcome};
use crate::services::prompt::Confirm;
use crate::services::tmdb_client::{CatalogApi, ResourceKind};

/// Referenced ids minus those already known, first occurrence order, no repeats
pub fn select_people_to_fetch(
    referenced: impl IntoIterator<Item = i64>,
    known: &HashSet<i64>,
) -> Vec<i64> {
    let mut seen = HashSet::new();
    referenced
        .into_iter()
        .filter(|id| !known.contains(id) && seen.insert(*id))
        .collect()
}

impl<C, P> SyncOrchestrator<C, P>
where
    C: CatalogApi,
    P: Confirm,
{
    pub(super) async fn phase_people(&self) -> PipelineResult<StageReport> {
        let referenced = self.referenced_person_ids().await?;
        let already_staged: HashSet<i64> =
            self.store.staged_people.stream_ids().try_collect().await?;
        let already_promoted: HashSet<i64> =
            self.store.main_people.stream_ids().try_collect().await?;
        let known: HashSet<i64> = already_staged.union(&already_promoted).copied().collect();

        let ids = select_people_to_fetch(referenced, &known);
        let total = ids.len();
        tracing::info!(
            run_id = %self.run_id,
            already_staged = already_staged.len(),
            already_promoted = already_promoted.len(),
            "{} new people to download",
            total
        );

        let tasks: Vec<_> = ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| self.fetch_person(id, index + 1, total))
            .collect();
        let outcomes = self.scheduler.run(self.scheduler.partition(tasks)).await?;

        Ok(StageReport::from_outcomes(Artifact::People, &outcomes))
    }

    /// Person ids from the credits of every staged movie, in movie order
    async fn referenced_person_ids(&self) -> PipelineResult<Vec<i64>> {
        let mut referenced = Vec::new();
        let mut credits = self.store.staged_movies.stream_field("credits");

        while let Some((movie_id, value)) = credits.try_next().await? {
            let Some(value) = value else { continue };
            match serde_json::from_value::<Credits>(value) {
                Ok(credits) => referenced.extend(credits.person_ids()),
                Err(e) => {
                    tracing::warn!(run_id = %self.run_id, movie_id, error = %e, "Unreadable credits, skipping");
                }
            }
        }

        Ok(referenced)
    }

    async fn fetch_person(&self, id: i64, position: usize, total: usize) -> PipelineResult<TaskOutcome> {
        tracing::debug!(run_id = %self.run_id, person_id = id, "{}/{} Downloading person...", position, total);

        let outcome = self.api.fetch(ResourceKind::Person, id).await?;
        let body = match self.found_or_skip(ResourceKind::Person, id, outcome) {
            Ok(body) => body,
            Err(skipped) => return Ok(skipped),
        };

        let person: Person = match serde_json::from_value(body) {
            Ok(person) => person,
            Err(e) => {
                tracing::warn!(run_id = %self.run_id, person_id = id, error = %e, "Person does not match schema, skipping");
                return Ok(TaskOutcome::Malformed);
            }
        };

        self.writer.write_person(&person).await?;
        tracing::info!(
            run_id = %self.run_id,
            "{}/{}: Inserted '{}' in db.",
            position,
            total,
            person.name.as_deref().unwrap_or("unnamed")
        );
        Ok(TaskOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_staged_and_repeats_dropped() {
        let staged: HashSet<i64> = [2].into_iter().collect();
        assert_eq!(select_people_to_fetch(vec![1, 2, 2, 3], &staged), vec![1, 3]);
    }

    #[test]
    fn test_first_occurrence_order_kept() {
        let staged = HashSet::new();
        assert_eq!(
            select_people_to_fetch(vec![9, 4, 9, 1, 4], &staged),
            vec![9, 4, 1]
        );
    }

    #[test]
    fn test_everything_staged_yields_nothing() {
        let staged: HashSet<i64> = [1, 2].into_iter().collect();
        assert!(select_people_to_fetch(vec![1, 2, 1], &staged).is_empty());
    }
}
