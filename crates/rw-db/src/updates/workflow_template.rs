//! Workflow template update builder.

use rw_core::entities::Stage;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// Replaces the whole stage list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,
}

pub struct TemplateUpdateBuilder(TemplateUpdate);

impl TemplateUpdateBuilder {
    pub fn new() -> Self {
        Self(TemplateUpdate::default())
    }

    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    pub fn description(mut self, val: Option<String>) -> Self {
        self.0.description = Some(val);
        self
    }

    pub fn stages(mut self, val: Vec<Stage>) -> Self {
        self.0.stages = Some(val);
        self
    }

    pub fn build(self) -> TemplateUpdate {
        self.0
    }
}

impl Default for TemplateUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
