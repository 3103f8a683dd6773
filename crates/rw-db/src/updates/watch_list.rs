//! Watch list update builder.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct WatchListUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sectors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_enabled: Option<bool>,
    #[serde(skip)]
    pub expected_version: Option<i64>,
}

impl WatchListUpdate {
    /// Whether any stored field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.keywords.is_none()
            && self.authorities.is_none()
            && self.sectors.is_none()
            && self.alert_threshold.is_none()
            && self.alert_enabled.is_none()
    }
}

pub struct WatchListUpdateBuilder(WatchListUpdate);

impl WatchListUpdateBuilder {
    pub fn new() -> Self {
        Self(WatchListUpdate::default())
    }

    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    pub fn description(mut self, val: Option<String>) -> Self {
        self.0.description = Some(val);
        self
    }

    pub fn keywords(mut self, val: Vec<String>) -> Self {
        self.0.keywords = Some(val);
        self
    }

    pub fn authorities(mut self, val: Vec<String>) -> Self {
        self.0.authorities = Some(val);
        self
    }

    pub fn sectors(mut self, val: Vec<String>) -> Self {
        self.0.sectors = Some(val);
        self
    }

    pub fn alert_threshold(mut self, val: f64) -> Self {
        self.0.alert_threshold = Some(val);
        self
    }

    pub fn alert_enabled(mut self, val: bool) -> Self {
        self.0.alert_enabled = Some(val);
        self
    }

    pub fn expected_version(mut self, val: i64) -> Self {
        self.0.expected_version = Some(val);
        self
    }

    pub fn build(self) -> WatchListUpdate {
        self.0
    }
}

impl Default for WatchListUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
