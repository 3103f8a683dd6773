//! Canned workflow templates.
//!
//! The stage tables here are fixed configuration. Changing them changes what
//! `create_from_preset` produces for every tenant, so they are regression-tested.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::{NewWorkflowTemplate, Stage};
use crate::errors::CoreError;

/// The built-in workflow presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPreset {
    StandardRegulatoryChange,
    QuickAssessment,
    ComplianceTracking,
}

impl WorkflowPreset {
    pub const ALL: [Self; 3] = [
        Self::StandardRegulatoryChange,
        Self::QuickAssessment,
        Self::ComplianceTracking,
    ];

    /// Human-facing template name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::StandardRegulatoryChange => "Standard Regulatory Change",
            Self::QuickAssessment => "Quick Assessment",
            Self::ComplianceTracking => "Compliance Tracking",
        }
    }

    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::StandardRegulatoryChange => "standard_regulatory_change",
            Self::QuickAssessment => "quick_assessment",
            Self::ComplianceTracking => "compliance_tracking",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::StandardRegulatoryChange => {
                "Full lifecycle from identification through implementation and review"
            }
            Self::QuickAssessment => "Lightweight triage for low-impact updates",
            Self::ComplianceTracking => "Track compliance status of an obligation",
        }
    }

    /// `(name, color)` pairs in stage order.
    #[must_use]
    pub const fn stage_table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::StandardRegulatoryChange => &[
                ("Identified", "#6b7280"),
                ("Impact Assessment", "#3b82f6"),
                ("Gap Analysis", "#8b5cf6"),
                ("Implementation", "#f59e0b"),
                ("Review", "#06b6d4"),
                ("Completed", "#10b981"),
            ],
            Self::QuickAssessment => &[
                ("New", "#6b7280"),
                ("Assessing", "#3b82f6"),
                ("Actioned", "#10b981"),
            ],
            Self::ComplianceTracking => &[
                ("Not Started", "#6b7280"),
                ("In Progress", "#f59e0b"),
                ("Under Review", "#3b82f6"),
                ("Compliant", "#10b981"),
                ("Non-Compliant", "#ef4444"),
            ],
        }
    }

    /// Stages with orders `1..=n`.
    #[must_use]
    pub fn stages(self) -> Vec<Stage> {
        self.stage_table()
            .iter()
            .zip(1..)
            .map(|((name, color), order)| Stage::new(*name, order, *color))
            .collect()
    }

    #[must_use]
    pub fn to_new_template(self) -> NewWorkflowTemplate {
        NewWorkflowTemplate {
            name: self.display_name().to_string(),
            description: Some(self.description().to_string()),
            stages: self.stages(),
        }
    }

    /// Resolve a preset from its display name or slug, ignoring case and
    /// surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` naming the known presets.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| {
                p.display_name().eq_ignore_ascii_case(wanted) || p.slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|p| p.display_name()).collect();
                CoreError::validation(format!(
                    "unknown workflow preset '{wanted}' (known: {})",
                    known.join(", ")
                ))
            })
    }
}

impl fmt::Display for WorkflowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
