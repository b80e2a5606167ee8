//! TMDB API client
//!
//! Every resource is fetched with a GET against `{base_url}{path}` carrying the
//! API key and language as query parameters. TMDB reports missing records in
//! the body (`status_code` 34) whatever the HTTP status, so that check comes
//! first. Any other non-2xx response (rate limiting, bad key, server errors)
//! is fatal. Successful bodies are sorted into found or malformed by `classify`.
//!
//! Throttling is not done here; the tick scheduler bounds request rates.

use async_trait::async_trait;
use cinesync_common::config::TmdbSettings;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::models::EnrichmentSlot;

const USER_AGENT: &str = concat!("cinesync-mirror/", env!("CARGO_PKG_VERSION"));

/// Body `status_code` TMDB uses for an unknown id
pub const NOT_FOUND_STATUS_CODE: i64 = 34;

/// Fatal remote failures
#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode {kind} response for id {id}: {message}")]
    Decode {
        kind: &'static str,
        id: i64,
        message: String,
    },

    #[error("TMDB answered {kind} request for id {id} with HTTP {status}: {body}")]
    Http {
        kind: &'static str,
        id: i64,
        status: u16,
        body: String,
    },

    #[error("Latest movie response has no usable id: {0}")]
    InvalidLatestId(String),

    #[error("Refusing to request {kind} for non-positive id {id}")]
    InvalidId { kind: &'static str, id: i64 },
}

/// Remote resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Movie,
    Images,
    Videos,
    Keywords,
    Similar,
    Credits,
    Person,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Movie => "movie",
            ResourceKind::Images => "images",
            ResourceKind::Videos => "videos",
            ResourceKind::Keywords => "keywords",
            ResourceKind::Similar => "similar",
            ResourceKind::Credits => "credits",
            ResourceKind::Person => "person",
        }
    }

    /// Request path relative to the API root
    pub fn path(self, id: i64) -> String {
        match self {
            ResourceKind::Movie => format!("movie/{id}"),
            ResourceKind::Person => format!("person/{id}"),
            other => format!("movie/{id}/{}", other.as_str()),
        }
    }

    /// Field whose presence marks a well-formed body
    pub fn identity_field(self) -> &'static str {
        match self {
            ResourceKind::Similar => "results",
            _ => "id",
        }
    }

    /// Part of a found body that gets staged
    ///
    /// Similar stores only its result list; every other kind stores the body.
    pub fn into_payload(self, mut body: Value) -> Value {
        match self {
            ResourceKind::Similar => body
                .get_mut(self.identity_field())
                .map(Value::take)
                .unwrap_or(Value::Null),
            _ => body,
        }
    }
}

impl From<EnrichmentSlot> for ResourceKind {
    fn from(slot: EnrichmentSlot) -> Self {
        match slot {
            EnrichmentSlot::Images => ResourceKind::Images,
            EnrichmentSlot::Videos => ResourceKind::Videos,
            EnrichmentSlot::Keywords => ResourceKind::Keywords,
            EnrichmentSlot::Similar => ResourceKind::Similar,
            EnrichmentSlot::Credits => ResourceKind::Credits,
        }
    }
}

/// Classified response body
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Found(Value),
    NotFound,
    /// Body missing its identity field; kept for logging
    Malformed(Value),
}

/// Classify a decoded response body
pub fn classify(kind: ResourceKind, body: Value) -> FetchOutcome {
    if is_not_found(&body) {
        return FetchOutcome::NotFound;
    }

    if is_present(body.get(kind.identity_field())) {
        FetchOutcome::Found(body)
    } else {
        FetchOutcome::Malformed(body)
    }
}

/// Classify a response by HTTP status and body
///
/// A not-found body wins over the status. Every other non-2xx response is an
/// error rather than a skippable record.
pub fn classify_response(
    kind: ResourceKind,
    id: i64,
    status: StatusCode,
    body: Value,
) -> Result<FetchOutcome, TmdbError> {
    if is_not_found(&body) {
        return Ok(FetchOutcome::NotFound);
    }
    if !status.is_success() {
        return Err(TmdbError::Http {
            kind: kind.as_str(),
            id,
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    Ok(classify(kind, body))
}

fn is_not_found(body: &Value) -> bool {
    body.get("status_code").and_then(Value::as_i64) == Some(NOT_FOUND_STATUS_CODE)
}

/// Null, false, zero and the empty string do not count as present
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Extract a positive id from the `movie/latest` body
pub fn parse_latest_id(body: &Value) -> Result<i64, TmdbError> {
    let id = match body.get("id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(TmdbError::InvalidLatestId(body.to_string())),
    }
}

/// Read access to the remote catalog
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Highest movie id currently known upstream
    async fn latest_movie_id(&self) -> Result<i64, TmdbError>;

    /// Fetch and classify one resource
    async fn fetch(&self, kind: ResourceKind, id: i64) -> Result<FetchOutcome, TmdbError>;
}

/// HTTP client for the TMDB v3 API
pub struct TmdbClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    /// Build a client; requests carry no timeout
    pub fn new(settings: &TmdbSettings) -> Result<Self, TmdbError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        let mut base_url = settings.base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http_client,
            base_url,
            api_key: settings.api_key.clone(),
            language: settings.language.clone(),
        })
    }

    /// Request URL without the query string
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(
        &self,
        kind: ResourceKind,
        id: i64,
        path: &str,
    ) -> Result<(StatusCode, Value), TmdbError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "Querying TMDB");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())])
            .send()
            .await
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TmdbError::Network(e.to_string()))?;

        let body = serde_json::from_str(&text).map_err(|e| TmdbError::Decode {
            kind: kind.as_str(),
            id,
            message: format!("HTTP {}: {}", status.as_u16(), e),
        })?;
        Ok((status, body))
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn latest_movie_id(&self) -> Result<i64, TmdbError> {
        let (status, body) = self.get_json(ResourceKind::Movie, 0, "movie/latest").await?;
        if !status.is_success() {
            return Err(TmdbError::Http {
                kind: ResourceKind::Movie.as_str(),
                id: 0,
                status: status.as_u16(),
                body: body.to_string(),
            });
        }
        let latest = parse_latest_id(&body)?;
        tracing::info!(latest, "TMDB latest movie id");
        Ok(latest)
    }

    async fn fetch(&self, kind: ResourceKind, id: i64) -> Result<FetchOutcome, TmdbError> {
        if id <= 0 {
            return Err(TmdbError::InvalidId {
                kind: kind.as_str(),
                id,
            });
        }

        let (status, body) = self.get_json(kind, id, &kind.path(id)).await?;
        classify_response(kind, id, status, body)
    }
}
