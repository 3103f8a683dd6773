use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The relevance criteria of a watch list. Empty lists mean "any".
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct WatchCriteria {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub authorities: Vec<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
}

impl WatchCriteria {
    /// True when no dimension restricts anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.authorities.is_empty() && self.sectors.is_empty()
    }
}

/// A saved relevance profile owned by its creator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct WatchList {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub criteria: WatchCriteria,
    pub alert_threshold: f64,
    pub alert_enabled: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set for creating a watch list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewWatchList {
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub criteria: WatchCriteria,
    pub alert_threshold: f64,
    #[serde(default = "default_alert_enabled")]
    pub alert_enabled: bool,
}

const fn default_alert_enabled() -> bool {
    true
}
