//! Document store for staged and canonical collections
//!
//! Each collection is one SQLite table keyed by the catalog id, holding the
//! record as a JSON document. Four collections make up a `Store`: the canonical
//! movies and people the application reads, and the staging copies a run
//! fills before promotion.

pub mod collection;

pub use collection::{Collection, StoreError};

use cinesync_common::config::CollectionNames;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Connections held by the pool; streaming reads and writes run side by side
pub const POOL_SIZE: u32 = 5;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if needed) the database behind `database_url`
pub async fn init_database_pool(database_url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(POOL_SIZE)
        .connect_with(options)
        .await?;

    tracing::debug!(pool_size = POOL_SIZE, "Database pool opened");
    Ok(pool)
}

/// The four collections a sync run touches
#[derive(Debug, Clone)]
pub struct Store {
    pub main_movies: Collection,
    pub main_people: Collection,
    pub staged_movies: Collection,
    pub staged_people: Collection,
}

impl Store {
    /// Open all configured collections, creating missing tables
    pub async fn open(pool: &SqlitePool, names: &CollectionNames) -> Result<Self, StoreError> {
        let store = Self {
            main_movies: Collection::open(pool, &names.main_movies).await?,
            main_people: Collection::open(pool, &names.main_people).await?,
            staged_movies: Collection::open(pool, &names.staged_movies).await?,
            staged_people: Collection::open(pool, &names.staged_people).await?,
        };

        tracing::info!(
            main_movies = %names.main_movies,
            main_people = %names.main_people,
            staged_movies = %names.staged_movies,
            staged_people = %names.staged_people,
            "Collections ready"
        );
        Ok(store)
    }
}
