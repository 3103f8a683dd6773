//! Change item update builder.
//!
//! Stage and template binding are not here: they move only through
//! `assign_template`, `unassign_template` and `advance_item`.

use chrono::NaiveDate;
use rw_core::enums::{ImpactLevel, Priority};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_level: Option<ImpactLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<Option<String>>,
    #[serde(skip)]
    pub expected_version: Option<i64>,
}

pub struct ChangeItemUpdateBuilder(ChangeItemUpdate);

impl ChangeItemUpdateBuilder {
    pub fn new() -> Self {
        Self(ChangeItemUpdate::default())
    }

    pub fn title(mut self, val: impl Into<String>) -> Self {
        self.0.title = Some(val.into());
        self
    }

    pub fn description(mut self, val: Option<String>) -> Self {
        self.0.description = Some(val);
        self
    }

    pub fn priority(mut self, val: Priority) -> Self {
        self.0.priority = Some(val);
        self
    }

    pub fn impact_level(mut self, val: ImpactLevel) -> Self {
        self.0.impact_level = Some(val);
        self
    }

    pub fn due_date(mut self, val: Option<NaiveDate>) -> Self {
        self.0.due_date = Some(val);
        self
    }

    pub fn authority(mut self, val: Option<String>) -> Self {
        self.0.authority = Some(val);
        self
    }

    pub fn sector(mut self, val: Option<String>) -> Self {
        self.0.sector = Some(val);
        self
    }

    pub fn expected_version(mut self, val: i64) -> Self {
        self.0.expected_version = Some(val);
        self
    }

    pub fn build(self) -> ChangeItemUpdate {
        self.0
    }
}

impl Default for ChangeItemUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
