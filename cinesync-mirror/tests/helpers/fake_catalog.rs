//! In-memory stand-in for the TMDB API
//!
//! Unscripted requests get a plausible body for their kind. Individual
//! (kind, id) pairs can be scripted to return a custom body, a not-found
//! marker, an HTTP error status or a transport failure.

use async_trait::async_trait;
use cinesync_mirror::services::tmdb_client::{
    classify, classify_response, CatalogApi, FetchOutcome, ResourceKind, TmdbError,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub type CallLog = Arc<Mutex<Vec<(ResourceKind, i64)>>>;

#[derive(Debug, Clone)]
enum Scripted {
    Body(Value),
    NotFound,
    HttpError(StatusCode, Value),
    TransportError,
}

pub struct FakeCatalog {
    latest: i64,
    scripted: HashMap<(ResourceKind, i64), Scripted>,
    credits: HashMap<i64, Value>,
    calls: CallLog,
}

impl FakeCatalog {
    pub fn new(latest: i64) -> Self {
        Self {
            latest,
            scripted: HashMap::new(),
            credits: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_body(mut self, kind: ResourceKind, id: i64, body: Value) -> Self {
        self.scripted.insert((kind, id), Scripted::Body(body));
        self
    }

    pub fn with_not_found(mut self, kind: ResourceKind, id: i64) -> Self {
        self.scripted.insert((kind, id), Scripted::NotFound);
        self
    }

    /// Answer with a non-2xx status and the given body
    pub fn with_http_error(mut self, kind: ResourceKind, id: i64, status: StatusCode, body: Value) -> Self {
        self.scripted.insert((kind, id), Scripted::HttpError(status, body));
        self
    }

    pub fn with_transport_error(mut self, kind: ResourceKind, id: i64) -> Self {
        self.scripted.insert((kind, id), Scripted::TransportError);
        self
    }

    /// Credits returned for `movie_id`
    pub fn with_credits(mut self, movie_id: i64, cast: &[i64], crew: &[i64]) -> Self {
        self.credits.insert(movie_id, credits_body(movie_id, cast, crew));
        self
    }

    /// Handle to the request log; stays valid after the catalog is moved
    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    fn default_body(&self, kind: ResourceKind, id: i64) -> Value {
        match kind {
            ResourceKind::Movie => json!({
                "id": id,
                "title": format!("Movie {id}"),
                "release_date": "2020-01-01",
                "runtime": 101
            }),
            ResourceKind::Images => json!({"id": id, "backdrops": [], "posters": []}),
            ResourceKind::Videos => json!({"id": id, "results": []}),
            ResourceKind::Keywords => json!({"id": id, "keywords": [{"id": 1, "name": "heist"}]}),
            ResourceKind::Similar => json!({
                "page": 1,
                "results": [{"id": id + 1000}],
                "total_pages": 1,
                "total_results": 1
            }),
            ResourceKind::Credits => self
                .credits
                .get(&id)
                .cloned()
                .unwrap_or_else(|| credits_body(id, &[], &[])),
            ResourceKind::Person => json!({
                "id": id,
                "name": format!("Person {id}"),
                "birthday": "1970-01-01"
            }),
        }
    }
}

pub fn credits_body(movie_id: i64, cast: &[i64], crew: &[i64]) -> Value {
    let refs = |ids: &[i64]| ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>();
    json!({"id": movie_id, "cast": refs(cast), "crew": refs(crew)})
}

/// Ids requested for one kind, sorted
pub fn requested(log: &CallLog, kind: ResourceKind) -> Vec<i64> {
    let mut ids: Vec<i64> = log
        .lock()
        .unwrap()
        .iter()
        .filter(|(k, _)| *k == kind)
        .map(|(_, id)| *id)
        .collect();
    ids.sort_unstable();
    ids
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn latest_movie_id(&self) -> Result<i64, TmdbError> {
        Ok(self.latest)
    }

    async fn fetch(&self, kind: ResourceKind, id: i64) -> Result<FetchOutcome, TmdbError> {
        self.calls.lock().unwrap().push((kind, id));
        tokio::task::yield_now().await;

        match self.scripted.get(&(kind, id)) {
            Some(Scripted::Body(body)) => Ok(classify(kind, body.clone())),
            Some(Scripted::NotFound) => Ok(classify(
                kind,
                json!({"status_code": 34, "status_message": "The resource you requested could not be found."}),
            )),
            Some(Scripted::HttpError(status, body)) => classify_response(kind, id, *status, body.clone()),
            Some(Scripted::TransportError) => Err(TmdbError::Network("connection reset by peer".to_string())),
            None => Ok(classify(kind, self.default_body(kind, id))),
        }
    }
}
