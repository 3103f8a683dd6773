use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A regulatory-news item handed over by the ingestion pipeline.
///
/// Immutable once ingested: the store keeps the first copy it sees for an id.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RegulatoryUpdate {
    pub id: String,
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    pub authority: String,
    #[serde(default)]
    pub sectors: Vec<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}
