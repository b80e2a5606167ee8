//! DIFF_CHECKING: decide whether there is anything to download

use super::SyncOrchestrator;
use crate::error::PipelineResult;
use crate::models::{Event, IdRange};
use crate::services::prompt::{separator, Confirm};
use crate::services::tmdb_client::CatalogApi;

/// Local latest id assumed when the canonical movies collection is empty
pub const DEFAULT_LOCAL_LATEST_ID: i64 = 1;

/// Turn the two latest ids into the next event
///
/// Nothing to do unless the remote id is ahead; otherwise the range covers
/// every id after the local latest up to and including the remote latest.
pub fn plan_download(local_latest: i64, remote_latest: i64) -> Event {
    if remote_latest <= local_latest {
        Event::NoNewMovies {
            local_latest,
            remote_latest,
        }
    } else {
        Event::NewMoviesFound {
            range: IdRange::new(local_latest + 1, remote_latest),
            local_latest,
            remote_latest,
        }
    }
}

pub fn download_question(local_latest: i64, remote_latest: i64) -> String {
    [
        separator(),
        format!("Your local latest id is: {local_latest}."),
        format!("TMDB latest id is: {remote_latest}."),
        format!("There are {} new movies.", remote_latest - local_latest),
        "Do you want to download them now? [Y/n]".to_string(),
    ]
    .join("\n")
}

impl<C, P> SyncOrchestrator<C, P>
where
    C: CatalogApi,
    P: Confirm,
{
    pub(super) async fn phase_diff(&self) -> PipelineResult<Event> {
        let local_latest = self
            .store
            .main_movies
            .max_id()
            .await?
            .unwrap_or(DEFAULT_LOCAL_LATEST_ID);
        let remote_latest = self.api.latest_movie_id().await?;

        tracing::info!(
            run_id = %self.run_id,
            local_latest,
            remote_latest,
            "Compared latest movie ids"
        );

        let event = plan_download(local_latest, remote_latest);
        if let Event::NoNewMovies { .. } = event {
            tracing::info!(run_id = %self.run_id, "There are no new movies");
        }
        Ok(event)
    }
}
