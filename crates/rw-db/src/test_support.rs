//! Shared test utilities for rw-db unit tests.

pub(crate) mod helpers {
    use chrono::{DateTime, TimeZone, Utc};
    use rw_core::entities::{
        NewChangeItem, NewWatchList, RegulatoryChangeItem, RegulatoryUpdate, WatchCriteria,
        WatchList, WorkflowTemplate,
    };
    use rw_core::matcher::Matcher;

    use crate::RegDb;
    use crate::service::RegService;

    /// Create an in-memory `RegService` with default matching.
    pub async fn test_service() -> RegService {
        let db = RegDb::open_local(":memory:").await.unwrap();
        RegService::from_db(db, Matcher::default(), 2)
    }

    pub fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
    }

    pub fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| (*s).to_string()).collect()
    }

    pub fn update(id: &str, headline: &str, authority: &str, sectors: &[&str]) -> RegulatoryUpdate {
        RegulatoryUpdate {
            id: id.to_string(),
            headline: headline.to_string(),
            summary: String::new(),
            authority: authority.to_string(),
            sectors: strings(sectors),
            published_at: ts(14),
            tags: Vec::new(),
        }
    }

    /// The AML/sanctions list used across the scoring scenarios.
    pub fn aml_watch_list() -> NewWatchList {
        NewWatchList {
            owner_id: "usr-1".into(),
            name: "Sanctions desk".into(),
            description: None,
            criteria: WatchCriteria {
                keywords: strings(&["AML", "sanctions"]),
                authorities: strings(&["FCA"]),
                sectors: Vec::new(),
            },
            alert_threshold: 0.6,
            alert_enabled: true,
        }
    }

    pub async fn create_aml_list(svc: &RegService) -> WatchList {
        svc.create_watch_list(aml_watch_list()).await.unwrap()
    }

    pub async fn quick_template(svc: &RegService) -> WorkflowTemplate {
        svc.create_from_preset("Quick Assessment").await.unwrap()
    }

    pub async fn item_on(svc: &RegService, template: &WorkflowTemplate) -> RegulatoryChangeItem {
        svc.create_change_item(NewChangeItem {
            title: "Update screening rules".into(),
            workflow_template_id: Some(template.id.clone()),
            ..NewChangeItem::default()
        })
        .await
        .unwrap()
    }
}
