use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ImpactLevel, Priority};
use crate::stage::StageAssignment;

use super::Stage;

/// A regulatory change a compliance team is working through.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RegulatoryChangeItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub assignment: StageAssignment,
    pub priority: Priority,
    pub impact_level: ImpactLevel,
    pub due_date: Option<NaiveDate>,
    pub authority: Option<String>,
    pub sector: Option<String>,
    pub source_update_id: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegulatoryChangeItem {
    #[must_use]
    pub fn workflow_template_id(&self) -> Option<&str> {
        self.assignment.template_id()
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<&str> {
        self.assignment.stage()
    }
}

/// Field set for creating a change item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewChangeItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workflow_template_id: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub impact_level: ImpactLevel,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub source_update_id: Option<String>,
}

/// One recorded stage transition. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StageHistoryEntry {
    pub seq: i64,
    pub item_id: String,
    pub from_stage: Option<String>,
    pub stage: String,
    pub transitioned_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// One stage of a template together with the items currently in it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BoardColumn {
    pub stage: Stage,
    pub items: Vec<RegulatoryChangeItem>,
}
