//! Input validation applied before any mutation.
//!
//! Each `validate_*` function returns a normalized copy of its input (trimmed
//! strings, de-duplicated lists, stages sorted by order) or a
//! `CoreError::Validation` describing the first problem found.

use std::collections::HashSet;

use crate::entities::{
    NewChangeItem, NewWatchList, NewWorkflowTemplate, RegulatoryUpdate, Stage, WatchCriteria,
};
use crate::errors::CoreError;

/// Trim `value` and reject it if blank.
///
/// # Errors
///
/// Returns `CoreError::Validation` if `value` is empty after trimming.
pub fn require_text(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Key two stage names collide on: trimmed, Unicode-lowercased.
#[must_use]
pub fn stage_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Trim an optional text field; blank becomes `None`.
#[must_use]
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Trim entries, drop blanks, and drop case-insensitive duplicates (first wins).
#[must_use]
pub fn clean_list(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .map(String::from)
        .collect()
}

/// # Errors
///
/// Returns `CoreError::Validation` unless `threshold` is finite and in `[0, 1]`.
pub fn validate_threshold(threshold: f64) -> Result<f64, CoreError> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(CoreError::validation(format!(
            "alert threshold must be between 0 and 1, got {threshold}"
        )));
    }
    Ok(threshold)
}

/// Clean criteria and require at least one restricting value.
///
/// A watch list with no criteria would match every update at 1.0, which is
/// never what a subscriber means, so it is rejected.
///
/// # Errors
///
/// Returns `CoreError::Validation` if every dimension is empty after cleaning.
pub fn validate_criteria(criteria: &WatchCriteria) -> Result<WatchCriteria, CoreError> {
    let cleaned = WatchCriteria {
        keywords: clean_list(&criteria.keywords),
        authorities: clean_list(&criteria.authorities),
        sectors: clean_list(&criteria.sectors),
    };
    if cleaned.is_empty() {
        return Err(CoreError::validation(
            "watch list needs at least one keyword, authority or sector",
        ));
    }
    Ok(cleaned)
}

/// # Errors
///
/// Returns `CoreError::Validation` for a blank owner or name, empty criteria,
/// or an out-of-range threshold.
pub fn validate_new_watch_list(input: &NewWatchList) -> Result<NewWatchList, CoreError> {
    Ok(NewWatchList {
        owner_id: require_text("owner_id", &input.owner_id)?,
        name: require_text("name", &input.name)?,
        description: optional_text(input.description.as_deref()),
        criteria: validate_criteria(&input.criteria)?,
        alert_threshold: validate_threshold(input.alert_threshold)?,
        alert_enabled: input.alert_enabled,
    })
}

/// Accepts `#rgb` and `#rrggbb`.
///
/// # Errors
///
/// Returns `CoreError::Validation` for anything else.
pub fn validate_color(color: &str) -> Result<String, CoreError> {
    let c = color.trim();
    let hex = c.strip_prefix('#').unwrap_or("");
    if (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        Ok(c.to_lowercase())
    } else {
        Err(CoreError::validation(format!(
            "stage color must look like #rgb or #rrggbb, got '{color}'"
        )))
    }
}

/// Normalize a stage list: at least one stage, non-blank names unique ignoring
/// case, unique orders, valid colors. Returned sorted by order.
///
/// # Errors
///
/// Returns `CoreError::Validation` describing the first offending stage.
pub fn validate_stages(stages: &[Stage]) -> Result<Vec<Stage>, CoreError> {
    if stages.is_empty() {
        return Err(CoreError::validation(
            "workflow template needs at least one stage",
        ));
    }

    let mut names = HashSet::new();
    let mut orders = HashSet::new();
    let mut out = Vec::with_capacity(stages.len());
    for stage in stages {
        let name = require_text("stage name", &stage.name)?;
        if !names.insert(stage_key(&name)) {
            return Err(CoreError::validation(format!(
                "duplicate stage name '{name}'"
            )));
        }
        if !orders.insert(stage.order) {
            return Err(CoreError::validation(format!(
                "duplicate stage order {} (stage '{name}')",
                stage.order
            )));
        }
        out.push(Stage {
            name,
            order: stage.order,
            color: validate_color(&stage.color)?,
        });
    }
    out.sort_by_key(|s| s.order);
    Ok(out)
}

/// # Errors
///
/// Returns `CoreError::Validation` for a blank name or an invalid stage list.
pub fn validate_new_template(input: &NewWorkflowTemplate) -> Result<NewWorkflowTemplate, CoreError> {
    Ok(NewWorkflowTemplate {
        name: require_text("template name", &input.name)?,
        description: optional_text(input.description.as_deref()),
        stages: validate_stages(&input.stages)?,
    })
}

/// # Errors
///
/// Returns `CoreError::Validation` for a blank title.
pub fn validate_new_change_item(input: &NewChangeItem) -> Result<NewChangeItem, CoreError> {
    Ok(NewChangeItem {
        title: require_text("title", &input.title)?,
        description: optional_text(input.description.as_deref()),
        workflow_template_id: optional_text(input.workflow_template_id.as_deref()),
        priority: input.priority,
        impact_level: input.impact_level,
        due_date: input.due_date,
        authority: optional_text(input.authority.as_deref()),
        sector: optional_text(input.sector.as_deref()),
        source_update_id: optional_text(input.source_update_id.as_deref()),
    })
}

/// Updates arrive from the ingestion pipeline; only identity and the fields
/// the matcher reads are required.
///
/// # Errors
///
/// Returns `CoreError::Validation` for a blank id, headline or authority.
pub fn validate_update(update: &RegulatoryUpdate) -> Result<RegulatoryUpdate, CoreError> {
    Ok(RegulatoryUpdate {
        id: require_text("update id", &update.id)?,
        headline: require_text("headline", &update.headline)?,
        summary: update.summary.trim().to_string(),
        authority: require_text("authority", &update.authority)?,
        sectors: clean_list(&update.sectors),
        published_at: update.published_at,
        tags: clean_list(&update.tags),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| (*s).to_string()).collect()
    }

    fn watch_list(criteria: WatchCriteria, threshold: f64) -> NewWatchList {
        NewWatchList {
            owner_id: "usr-1".into(),
            name: "AML".into(),
            description: None,
            criteria,
            alert_threshold: threshold,
            alert_enabled: true,
        }
    }

    #[test]
    fn clean_list_trims_and_dedupes() {
        assert_eq!(
            clean_list(&strings(&[" AML ", "aml", "", "Sanctions", "  "])),
            strings(&["AML", "Sanctions"])
        );
    }

    #[test]
    fn threshold_bounds() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(-0.01).is_err());
        assert!(validate_threshold(1.01).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }

    #[test]
    fn empty_criteria_rejected() {
        let blank = WatchCriteria {
            keywords: strings(&["  "]),
            authorities: vec![],
            sectors: vec![],
        };
        let err = validate_new_watch_list(&watch_list(blank, 0.5)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn watch_list_is_normalized() {
        let input = NewWatchList {
            name: "  Sanctions desk ".into(),
            description: Some("   ".into()),
            ..watch_list(
                WatchCriteria {
                    keywords: strings(&["AML", "aml"]),
                    authorities: strings(&["FCA"]),
                    sectors: vec![],
                },
                0.6,
            )
        };
        let out = validate_new_watch_list(&input).unwrap();
        assert_eq!(out.name, "Sanctions desk");
        assert_eq!(out.description, None);
        assert_eq!(out.criteria.keywords, strings(&["AML"]));
    }

    #[test]
    fn blank_name_rejected() {
        let input = NewWatchList {
            name: " ".into(),
            ..watch_list(
                WatchCriteria {
                    keywords: strings(&["AML"]),
                    ..WatchCriteria::default()
                },
                0.5,
            )
        };
        assert!(validate_new_watch_list(&input).is_err());
    }

    #[test]
    fn colors() {
        assert_eq!(validate_color("#ABC").unwrap(), "#abc");
        assert!(validate_color("#a1b2c3").is_ok());
        assert!(validate_color("red").is_err());
        assert!(validate_color("#12345").is_err());
    }

    #[test]
    fn stage_names_collide_beyond_ascii() {
        let stages = vec![Stage::new("Étude", 1, "#000"), Stage::new(" étude", 2, "#fff")];
        assert!(validate_stages(&stages).is_err());
        assert_eq!(stage_key(" ÉTUDE "), stage_key("étude"));
    }

    #[test]
    fn stages_sorted_and_unique() {
        let stages = vec![
            Stage::new("Review", 2, "#000"),
            Stage::new("Draft", 1, "#fff"),
        ];
        let out = validate_stages(&stages).unwrap();
        assert_eq!(out[0].name, "Draft");

        let dup_name = vec![Stage::new("A", 1, "#000"), Stage::new("a", 2, "#000")];
        assert!(validate_stages(&dup_name).is_err());

        let dup_order = vec![Stage::new("A", 1, "#000"), Stage::new("B", 1, "#000")];
        assert!(validate_stages(&dup_order).is_err());

        assert!(validate_stages(&[]).is_err());
    }

    #[test]
    fn change_item_requires_title() {
        let item = NewChangeItem {
            title: "  ".into(),
            ..NewChangeItem::default()
        };
        assert!(validate_new_change_item(&item).is_err());

        let item = NewChangeItem {
            title: " Implement SCA ".into(),
            sector: Some(" ".into()),
            ..NewChangeItem::default()
        };
        let out = validate_new_change_item(&item).unwrap();
        assert_eq!(out.title, "Implement SCA");
        assert_eq!(out.sector, None);
    }

    #[test]
    fn update_requires_identity() {
        let update = RegulatoryUpdate {
            id: " fca-1 ".into(),
            headline: "FCA sanctions guidance".into(),
            summary: String::new(),
            authority: "FCA".into(),
            sectors: strings(&["Banking", "banking"]),
            published_at: chrono::Utc::now(),
            tags: vec![],
        };
        let out = validate_update(&update).unwrap();
        assert_eq!(out.id, "fca-1");
        assert_eq!(out.sectors, strings(&["Banking"]));

        let blank = RegulatoryUpdate {
            headline: "  ".into(),
            ..update
        };
        assert!(validate_update(&blank).is_err());
    }
}
