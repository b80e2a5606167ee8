//! Staged person record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Person discovered through the credits of a staged movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    /// Catalog id (unique key of the collection)
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default, deserialize_with = "super::lenient_date")]
    pub birthday: Option<NaiveDate>,
    #[serde(default, deserialize_with = "super::lenient_date")]
    pub deathday: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<i64>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub adult: Option<bool>,
    #[serde(default)]
    pub also_known_as: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
