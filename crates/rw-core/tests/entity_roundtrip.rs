//! Serde roundtrip and JsonSchema validation tests for all entity types.

use chrono::{NaiveDate, TimeZone, Utc};
use schemars::schema_for;
use rw_core::entities::*;
use rw_core::enums::*;
use rw_core::matcher::ScoreBreakdown;
use rw_core::presets::WorkflowPreset;
use rw_core::stage::StageAssignment;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            // Serde roundtrip
            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            // Schema validation
            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
}

roundtrip_and_validate!(
    update_roundtrip,
    RegulatoryUpdate,
    RegulatoryUpdate {
        id: "fca-2026-031".into(),
        headline: "FCA sanctions guidance".into(),
        summary: "Updated expectations for sanctions screening.".into(),
        authority: "FCA".into(),
        sectors: vec!["Banking".into(), "Payments".into()],
        published_at: ts(),
        tags: vec!["sanctions".into()],
    }
);

roundtrip_and_validate!(
    watch_list_roundtrip,
    WatchList,
    WatchList {
        id: "wl-a3f8b2c1".into(),
        owner_id: "usr-42".into(),
        name: "Sanctions desk".into(),
        description: Some("Everything AML".into()),
        criteria: WatchCriteria {
            keywords: vec!["AML".into(), "sanctions".into()],
            authorities: vec!["FCA".into()],
            sectors: vec![],
        },
        alert_threshold: 0.6,
        alert_enabled: true,
        version: 1,
        created_at: ts(),
        updated_at: ts(),
    }
);

roundtrip_and_validate!(
    match_record_roundtrip,
    MatchRecord,
    MatchRecord {
        id: "mat-00000001".into(),
        watch_list_id: "wl-a3f8b2c1".into(),
        update_id: "fca-2026-031".into(),
        match_score: 0.75,
        reviewed: true,
        matched_at: ts(),
        reviewed_at: Some(ts()),
    }
);

roundtrip_and_validate!(
    template_roundtrip,
    WorkflowTemplate,
    WorkflowTemplate {
        id: "wft-00000001".into(),
        name: "Quick Assessment".into(),
        description: None,
        stages: WorkflowPreset::QuickAssessment.stages(),
        created_at: ts(),
        updated_at: ts(),
    }
);

roundtrip_and_validate!(
    change_item_named_roundtrip,
    RegulatoryChangeItem,
    RegulatoryChangeItem {
        id: "rci-00000001".into(),
        title: "Update screening rules".into(),
        description: Some("Follow FCA guidance".into()),
        assignment: StageAssignment::named("wft-00000001", "Assessing"),
        priority: Priority::High,
        impact_level: ImpactLevel::Medium,
        due_date: NaiveDate::from_ymd_opt(2026, 6, 30),
        authority: Some("FCA".into()),
        sector: Some("Banking".into()),
        source_update_id: Some("fca-2026-031".into()),
        version: 3,
        created_at: ts(),
        updated_at: ts(),
    }
);

roundtrip_and_validate!(
    change_item_unassigned_roundtrip,
    RegulatoryChangeItem,
    RegulatoryChangeItem {
        id: "rci-00000002".into(),
        title: "Watch consultation".into(),
        description: None,
        assignment: StageAssignment::Unassigned,
        priority: Priority::Low,
        impact_level: ImpactLevel::Low,
        due_date: None,
        authority: None,
        sector: None,
        source_update_id: None,
        version: 1,
        created_at: ts(),
        updated_at: ts(),
    }
);

roundtrip_and_validate!(
    history_roundtrip,
    StageHistoryEntry,
    StageHistoryEntry {
        seq: 7,
        item_id: "rci-00000001".into(),
        from_stage: Some("New".into()),
        stage: "Assessing".into(),
        transitioned_at: ts(),
        notes: Some("Picked up by legal".into()),
    }
);

roundtrip_and_validate!(
    cross_link_roundtrip,
    CrossLink,
    CrossLink {
        id: "lnk-00000001".into(),
        source_type: EntityKind::Update,
        source_id: "fca-2026-031".into(),
        target_type: EntityKind::WorkflowItem,
        target_id: "rci-00000001".into(),
        created_at: ts(),
        notes: None,
    }
);

roundtrip_and_validate!(
    linked_items_roundtrip,
    LinkedItems,
    LinkedItems {
        groups: vec![LinkGroup {
            kind: EntityKind::Dossier,
            entities: vec![LinkedEntity {
                link_id: "lnk-00000002".into(),
                kind: EntityKind::Dossier,
                id: "dos-17".into(),
                notes: Some("Board pack".into()),
                created_at: ts(),
            }],
        }],
    }
);

roundtrip_and_validate!(
    counts_roundtrip,
    ConnectionCounts,
    ConnectionCounts {
        updates: 1,
        watch_lists: 2,
        dossiers: 0,
        policies: 1,
        kanban_items: 0,
        total: 4,
    }
);

roundtrip_and_validate!(
    breakdown_roundtrip,
    ScoreBreakdown,
    ScoreBreakdown {
        keyword: 0.5,
        authority: 1.0,
        sector: 1.0,
        total: 0.75,
    }
);

#[test]
fn watch_list_criteria_are_flattened() {
    let json = serde_json::json!({
        "owner_id": "usr-1",
        "name": "Payments",
        "keywords": ["PSD3"],
        "alert_threshold": 0.5
    });
    let new: NewWatchList = serde_json::from_value(json).unwrap();
    assert_eq!(new.criteria.keywords, vec!["PSD3".to_string()]);
    assert!(new.criteria.authorities.is_empty());
    assert!(new.alert_enabled, "alerts default to enabled");
}

#[test]
fn update_optional_lists_default_empty() {
    let json = r#"{"id":"u1","headline":"h","authority":"PRA","published_at":"2026-01-01T00:00:00Z"}"#;
    let update: RegulatoryUpdate = serde_json::from_str(json).unwrap();
    assert!(update.sectors.is_empty());
    assert!(update.tags.is_empty());
    assert!(update.summary.is_empty());
}
