//! Staged movie record
//!
//! Scalar metadata is typed; every other upstream field is carried verbatim in
//! `extra` so promotion copies the full document. The five enrichment slots
//! stay absent until their own stage writes them.

use super::run_stats::Artifact;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Movie as staged after the detail fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// Catalog id (unique key of the collection)
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub adult: Option<bool>,
    #[serde(default)]
    pub video: Option<bool>,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub revenue: Option<i64>,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default, deserialize_with = "super::lenient_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub genres: Vec<Value>,
    #[serde(default)]
    pub production_companies: Vec<Value>,
    #[serde(default)]
    pub production_countries: Vec<Value>,
    #[serde(default)]
    pub spoken_languages: Vec<Value>,
    #[serde(default)]
    pub belongs_to_collection: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<Value>,

    /// Upstream fields without a typed counterpart
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Enrichment slot of a staged movie, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentSlot {
    Images,
    Videos,
    Keywords,
    Similar,
    Credits,
}

impl EnrichmentSlot {
    pub const ORDER: [EnrichmentSlot; 5] = [
        EnrichmentSlot::Images,
        EnrichmentSlot::Videos,
        EnrichmentSlot::Keywords,
        EnrichmentSlot::Similar,
        EnrichmentSlot::Credits,
    ];

    /// Document field the slot is written to
    pub fn field_name(self) -> &'static str {
        match self {
            EnrichmentSlot::Images => "images",
            EnrichmentSlot::Videos => "videos",
            EnrichmentSlot::Keywords => "keywords",
            EnrichmentSlot::Similar => "similar",
            EnrichmentSlot::Credits => "credits",
        }
    }

    pub fn artifact(self) -> Artifact {
        match self {
            EnrichmentSlot::Images => Artifact::Images,
            EnrichmentSlot::Videos => Artifact::Videos,
            EnrichmentSlot::Keywords => Artifact::Keywords,
            EnrichmentSlot::Similar => Artifact::Similar,
            EnrichmentSlot::Credits => Artifact::Credits,
        }
    }

    /// Slot fetched after this one, `None` after credits
    pub fn next(self) -> Option<EnrichmentSlot> {
        let position = Self::ORDER.iter().position(|s| *s == self)?;
        Self::ORDER.get(position + 1).copied()
    }
}

impl std::fmt::Display for EnrichmentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Credits sub-document, reduced to the person references
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Option<Vec<CreditRef>>,
    #[serde(default)]
    pub crew: Option<Vec<CreditRef>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditRef {
    #[serde(default)]
    pub id: Option<i64>,
}

impl Credits {
    /// Referenced person ids, cast first then crew, duplicates kept
    pub fn person_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.cast
            .iter()
            .flatten()
            .chain(self.crew.iter().flatten())
            .filter_map(|credit| credit.id)
    }
}
