use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validation::stage_key;

/// One column of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub order: i32,
    pub color: String,
}

impl Stage {
    #[must_use]
    pub fn new(name: impl Into<String>, order: i32, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order,
            color: color.into(),
        }
    }
}

/// A named, ordered set of stages. `stages` is always kept sorted by `order`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub stages: Vec<Stage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowTemplate {
    /// The stage with the lowest order.
    #[must_use]
    pub fn first_stage(&self) -> Option<&Stage> {
        self.stages.iter().min_by_key(|s| s.order)
    }

    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Stage whose name matches `wanted` under `stage_key`.
    #[must_use]
    pub fn find_stage(&self, wanted: &str) -> Option<&Stage> {
        let key = stage_key(wanted);
        self.stages.iter().find(|s| stage_key(&s.name) == key)
    }

    #[must_use]
    pub fn has_stage(&self, name: &str) -> bool {
        self.stage(name).is_some()
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Field set for creating a workflow template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewWorkflowTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub stages: Vec<Stage>,
}
