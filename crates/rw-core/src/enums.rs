//! Priorities, impact levels, link endpoint kinds and matching options.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for SQL storage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// How urgently a change item needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ImpactLevel
// ---------------------------------------------------------------------------

/// Assessed business impact of a regulatory change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ImpactLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Kind of entity on either end of a cross-link.
///
/// Declaration order is the canonical orientation rank: when a link is stored,
/// the endpoint with the lower rank becomes the source. `Update` ranks lowest, so
/// an update is always stored as a source and never as a target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Update,
    WorkflowItem,
    #[serde(rename = "watchlist", alias = "watch_list")]
    WatchList,
    Dossier,
    Policy,
}

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Update,
        Self::WorkflowItem,
        Self::WatchList,
        Self::Dossier,
        Self::Policy,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::WorkflowItem => "workflow_item",
            Self::WatchList => "watchlist",
            Self::Dossier => "dossier",
            Self::Policy => "policy",
        }
    }

    /// Whether this kind may appear as the target of a stored link.
    #[must_use]
    pub const fn is_link_target(self) -> bool {
        !matches!(self, Self::Update)
    }

    /// Whether Regwatch owns entities of this kind (and can check they exist).
    /// Dossiers and policies are opaque references.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self, Self::Update | Self::WorkflowItem | Self::WatchList)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// KeywordMode
// ---------------------------------------------------------------------------

/// How a watch-list keyword is located in an update's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMode {
    /// Case-insensitive substring anywhere in the text.
    #[default]
    Substring,
    /// Case-insensitive occurrence bounded by non-alphanumerics or text edges.
    WholeWord,
}

impl KeywordMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Substring => "substring",
            Self::WholeWord => "whole_word",
        }
    }
}

impl fmt::Display for KeywordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ThresholdPreset
// ---------------------------------------------------------------------------

/// Named alert thresholds offered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPreset {
    Broad,
    Balanced,
    Focused,
    Strict,
}

impl ThresholdPreset {
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Broad => 0.3,
            Self::Balanced => 0.5,
            Self::Focused => 0.7,
            Self::Strict => 0.9,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Broad => "broad",
            Self::Balanced => "balanced",
            Self::Focused => "focused",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for ThresholdPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
