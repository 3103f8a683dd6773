use chrono::NaiveDate;
use rw_core::entities::Stage;
use rw_core::enums::ThresholdPreset;
use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().to_lowercase().replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str, field: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}' (expected YYYY-MM-DD): {error}"))
}

/// Parse an alert threshold given as a number or a preset name. Range is
/// checked by the store.
pub fn parse_threshold(raw: &str) -> anyhow::Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => parse_enum::<ThresholdPreset>(raw, "threshold").map(ThresholdPreset::value),
    }
}

/// Parse repeated `Name:#color` stage flags; order is their position.
pub fn parse_stages(raw: &[String]) -> anyhow::Result<Vec<Stage>> {
    raw.iter()
        .zip(1..)
        .map(|(flag, order)| {
            let (name, color) = flag
                .rsplit_once(':')
                .ok_or_else(|| anyhow::anyhow!("invalid stage '{flag}': expected Name:#color"))?;
            Ok(Stage::new(name.trim(), order, color.trim()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rw_core::enums::{EntityKind, Priority};

    use super::{parse_date, parse_enum, parse_stages, parse_threshold};

    #[test]
    fn parses_snake_case_enum() {
        let kind: EntityKind = parse_enum("workflow_item", "kind").expect("kind should parse");
        assert_eq!(kind, EntityKind::WorkflowItem);
    }

    #[test]
    fn parses_hyphenated_and_capitalised_alias() {
        let kind: EntityKind = parse_enum("Workflow-Item", "kind").expect("kind should parse");
        assert_eq!(kind, EntityKind::WorkflowItem);
        let priority: Priority = parse_enum("HIGH", "priority").expect("priority should parse");
        assert_eq!(priority, Priority::High);
    }

    #[test]
    fn errors_on_invalid_enum() {
        let err = parse_enum::<EntityKind>("ticket", "kind").expect_err("should fail");
        assert!(err.to_string().contains("invalid kind 'ticket'"));
    }

    #[test]
    fn parses_dates() {
        assert_eq!(
            parse_date("2026-09-30", "due").unwrap(),
            chrono::NaiveDate::from_ymd_opt(2026, 9, 30).unwrap()
        );
        assert!(parse_date("30/09/2026", "due").is_err());
    }

    #[test]
    fn thresholds_accept_numbers_and_presets() {
        assert!((parse_threshold("0.65").unwrap() - 0.65).abs() < f64::EPSILON);
        assert!((parse_threshold("Focused").unwrap() - 0.7).abs() < f64::EPSILON);
        assert!(parse_threshold("loose").is_err());
    }

    #[test]
    fn stages_take_position_order() {
        let stages = parse_stages(&[
            "Draft:#6b7280".to_string(),
            "Signed off:#10b981".to_string(),
        ])
        .unwrap();
        assert_eq!(stages[0].name, "Draft");
        assert_eq!(stages[1].order, 2);
        assert_eq!(stages[1].color, "#10b981");
        assert!(parse_stages(&["NoColor".to_string()]).is_err());
    }
}
