//! Writes fetched records into the staging collections
//!
//! Detail and person writes insert whole documents (a duplicate id is an
//! error). Enrichment writes set one field of an already staged movie.

use serde_json::Value;

use crate::db::{Collection, Store, StoreError};
use crate::models::{EnrichmentSlot, Movie, Person};

#[derive(Debug, Clone)]
pub struct StagingWriter {
    movies: Collection,
    people: Collection,
}

impl StagingWriter {
    pub fn new(store: &Store) -> Self {
        Self {
            movies: store.staged_movies.clone(),
            people: store.staged_people.clone(),
        }
    }

    /// Insert a newly fetched movie
    pub async fn write_detail(&self, movie: &Movie) -> Result<(), StoreError> {
        let doc = serde_json::to_value(movie)?;
        self.movies.insert(&doc).await
    }

    /// Set an enrichment slot on a staged movie
    pub async fn write_field(
        &self,
        movie_id: i64,
        slot: EnrichmentSlot,
        value: &Value,
    ) -> Result<(), StoreError> {
        self.movies.set_field(movie_id, slot.field_name(), value).await
    }

    /// Insert a newly fetched person
    pub async fn write_person(&self, person: &Person) -> Result<(), StoreError> {
        let doc = serde_json::to_value(person)?;
        self.people.insert(&doc).await
    }

    /// Empty the staged movies ahead of a detail download
    pub async fn reset_movies(&self) -> Result<u64, StoreError> {
        let removed = self.movies.clear().await?;
        tracing::info!(
            collection = %self.movies.name(),
            removed,
            "Cleared staged movies"
        );
        Ok(removed)
    }

    /// Empty the staged people left over from an earlier run
    pub async fn reset_people(&self) -> Result<u64, StoreError> {
        let removed = self.people.clear().await?;
        tracing::info!(
            collection = %self.people.name(),
            removed,
            "Cleared staged people"
        );
        Ok(removed)
    }
}
