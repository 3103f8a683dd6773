use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One watch list matching one update, frozen at ingestion time.
///
/// The score is never recomputed; only `reviewed`/`reviewed_at` change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MatchRecord {
    pub id: String,
    pub watch_list_id: String,
    pub update_id: String,
    pub match_score: f64,
    pub reviewed: bool,
    pub matched_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Match counts for a watch list badge.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MatchSummary {
    pub total: u64,
    pub unreviewed: u64,
}
