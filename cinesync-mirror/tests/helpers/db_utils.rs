//! Database Test Utilities

use anyhow::Result;
use cinesync_common::config::CollectionNames;
use cinesync_mirror::db::{init_database_pool, Collection, Store};
use cinesync_mirror::services::TickScheduler;
use serde_json::Value;
use sqlx::SqlitePool;
use std::time::Duration;
use tempfile::TempDir;

pub fn test_collection_names() -> CollectionNames {
    CollectionNames {
        main_movies: "movies".to_string(),
        main_people: "people".to_string(),
        staged_movies: "new_movies".to_string(),
        staged_people: "new_people".to_string(),
    }
}

/// Create temporary test database with all four collections
///
/// Returns (TempDir, SqlitePool, Store) - TempDir must be kept alive for duration of test
pub async fn create_test_store() -> Result<(TempDir, SqlitePool, Store)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_cinesync.db");

    let pool = init_database_pool(&format!("sqlite:{}", db_path.display())).await?;
    let store = Store::open(&pool, &test_collection_names()).await?;

    Ok((temp_dir, pool, store))
}

/// Insert documents directly, bypassing the pipeline
pub async fn seed(collection: &Collection, docs: impl IntoIterator<Item = Value>) {
    for doc in docs {
        collection.insert(&doc).await.unwrap();
    }
}

/// Small ticks with a negligible cooldown
pub fn fast_scheduler(per_tick: usize) -> TickScheduler {
    TickScheduler::new(per_tick, Duration::from_millis(1))
}
