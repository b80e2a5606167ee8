//! AWAITING_PROMOTION / TRANSFERRING: copy staged collections to the canonical ones

use futures::TryStreamExt;
use serde::Serialize;

use crate::db::{Collection, Store, StoreError};
use crate::models::RunStats;
use crate::services::prompt::separator;

/// Documents copied by a promotion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    pub movies: u64,
    pub people: u64,
}

/// Copy every staged movie and person into the canonical collections
///
/// Documents are copied verbatim. Staged collections are left untouched. A
/// document whose id already exists in the target aborts the promotion.
pub async fn promote(store: &Store) -> Result<TransferReport, StoreError> {
    tracing::info!("Starting to transfer movies...");
    let movies = copy_documents(&store.staged_movies, &store.main_movies).await?;
    tracing::info!(
        "{} movies have been transferred from '{}' to '{}' collection.",
        movies,
        store.staged_movies.name(),
        store.main_movies.name()
    );

    tracing::info!("Starting to transfer people...");
    let people = copy_documents(&store.staged_people, &store.main_people).await?;
    tracing::info!(
        "{} people have been transferred from '{}' to '{}' collection.",
        people,
        store.staged_people.name(),
        store.main_people.name()
    );

    tracing::info!("All data has been transferred");
    Ok(TransferReport { movies, people })
}

async fn copy_documents(from: &Collection, to: &Collection) -> Result<u64, StoreError> {
    let mut documents = from.stream_documents();
    let mut copied = 0;
    while let Some(doc) = documents.try_next().await? {
        to.insert(&doc).await?;
        copied += 1;
    }
    Ok(copied)
}

pub fn promotion_question(stats: &RunStats, store: &Store) -> String {
    let mut lines = vec![
        separator(),
        "All downloads are finished.".to_string(),
        format!(
            "All the available data was downloaded and stored in the temporary '{}' and '{}' collections.",
            store.staged_movies.name(),
            store.staged_people.name()
        ),
        "Here are some stats for the collected data:".to_string(),
    ];
    lines.extend(stats.summary_lines());
    lines.extend([
        separator(),
        "Please go to your database and ensure that everything is in order.".to_string(),
        format!(
            "If everything looks right answer here with 'Y' to transfer all the new data to the main collections ('{}' and '{}').",
            store.main_movies.name(),
            store.main_people.name()
        ),
        "If not you can answer with 'n' or quit now and do that later with the option '--transfer-data'."
            .to_string(),
        "Do you want to transfer the new data to the main collections now? [Y/n]".to_string(),
    ]);
    lines.join("\n")
}
