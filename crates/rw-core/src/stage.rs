//! Stage assignment of a change item.
//!
//! An item is either not bound to any workflow template, or it sits in one named
//! stage of exactly one template. The workflow engine only ever moves items that
//! are in the `Named` state; any named stage may follow any other.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where a change item currently sits in its workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StageAssignment {
    #[default]
    Unassigned,
    Named { template_id: String, stage: String },
}

impl StageAssignment {
    #[must_use]
    pub fn named(template_id: impl Into<String>, stage: impl Into<String>) -> Self {
        Self::Named {
            template_id: template_id.into(),
            stage: stage.into(),
        }
    }

    /// Rebuild from the two nullable SQL columns.
    ///
    /// A template id without a stage cannot be produced by the engine; it is read
    /// back as `None` so the caller can report corrupt data.
    #[must_use]
    pub fn from_columns(template_id: Option<String>, stage: Option<String>) -> Option<Self> {
        match (template_id, stage) {
            (None, None) => Some(Self::Unassigned),
            (Some(template_id), Some(stage)) => Some(Self::Named { template_id, stage }),
            _ => None,
        }
    }

    #[must_use]
    pub fn template_id(&self) -> Option<&str> {
        match self {
            Self::Unassigned => None,
            Self::Named { template_id, .. } => Some(template_id),
        }
    }

    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Unassigned => None,
            Self::Named { stage, .. } => Some(stage),
        }
    }

    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Named { .. })
    }
}
