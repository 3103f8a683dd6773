//! Watch list repository: CRUD with optimistic versioning.

use chrono::Utc;
use serde::Serialize;

use rw_core::entities::{NewWatchList, WatchCriteria, WatchList};
use rw_core::enums::EntityKind;
use rw_core::ids::PREFIX_WATCH_LIST;
use rw_core::validation::validate_new_watch_list;

use crate::error::DatabaseError;
use crate::helpers::{
    count_rows, format_datetime, get_bool, get_opt_string, parse_datetime, parse_json_list,
    to_json_list,
};
use crate::repos::cross_link::delete_links_touching;
use crate::service::RegService;
use crate::updates::watch_list::WatchListUpdate;

const SELECT_COLS: &str = "id, owner_id, name, description, keywords, authorities, sectors, \
                           alert_threshold, alert_enabled, version, created_at, updated_at";

fn row_to_watch_list(row: &libsql::Row) -> Result<WatchList, DatabaseError> {
    Ok(WatchList {
        id: row.get::<String>(0)?,
        owner_id: row.get::<String>(1)?,
        name: row.get::<String>(2)?,
        description: get_opt_string(row, 3)?,
        criteria: WatchCriteria {
            keywords: parse_json_list(&row.get::<String>(4)?)?,
            authorities: parse_json_list(&row.get::<String>(5)?)?,
            sectors: parse_json_list(&row.get::<String>(6)?)?,
        },
        alert_threshold: row.get::<f64>(7)?,
        alert_enabled: get_bool(row, 8)?,
        version: row.get::<i64>(9)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

/// What `delete_watch_list` removed alongside the list itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchListDeletion {
    pub watch_list_id: String,
    pub matches_removed: u64,
    pub links_removed: u64,
}

pub(crate) async fn fetch_watch_list(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<WatchList>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM watch_lists WHERE id = ?1"),
            [id],
        )
        .await?;
    rows.next().await?.map(|row| row_to_watch_list(&row)).transpose()
}

pub(crate) async fn watch_list_exists(
    conn: &libsql::Connection,
    id: &str,
) -> Result<bool, DatabaseError> {
    Ok(count_rows(conn, "SELECT COUNT(*) FROM watch_lists WHERE id = ?1", [id]).await? > 0)
}

/// `NotFound` unless the watch list exists.
pub(crate) async fn require_watch_list(
    conn: &libsql::Connection,
    id: &str,
) -> Result<(), DatabaseError> {
    if watch_list_exists(conn, id).await? {
        Ok(())
    } else {
        Err(DatabaseError::not_found("watch_list", id))
    }
}

/// Enabled watch lists in creation order.
pub(crate) async fn fetch_enabled_watch_lists(
    conn: &libsql::Connection,
) -> Result<Vec<WatchList>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {SELECT_COLS} FROM watch_lists WHERE alert_enabled = 1 ORDER BY created_at, id"
            ),
            (),
        )
        .await?;
    let mut lists = Vec::new();
    while let Some(row) = rows.next().await? {
        lists.push(row_to_watch_list(&row)?);
    }
    Ok(lists)
}

/// Apply `update` over `current`, returning the candidate row before validation.
fn merge(current: &WatchList, update: &WatchListUpdate) -> NewWatchList {
    NewWatchList {
        owner_id: current.owner_id.clone(),
        name: update.name.clone().unwrap_or_else(|| current.name.clone()),
        description: update
            .description
            .clone()
            .unwrap_or_else(|| current.description.clone()),
        criteria: WatchCriteria {
            keywords: update
                .keywords
                .clone()
                .unwrap_or_else(|| current.criteria.keywords.clone()),
            authorities: update
                .authorities
                .clone()
                .unwrap_or_else(|| current.criteria.authorities.clone()),
            sectors: update
                .sectors
                .clone()
                .unwrap_or_else(|| current.criteria.sectors.clone()),
        },
        alert_threshold: update.alert_threshold.unwrap_or(current.alert_threshold),
        alert_enabled: update.alert_enabled.unwrap_or(current.alert_enabled),
    }
}

async fn update_watch_list_in(
    conn: &libsql::Connection,
    id: &str,
    update: &WatchListUpdate,
) -> Result<WatchList, DatabaseError> {
    let current = fetch_watch_list(conn, id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("watch_list", id))?;

    if let Some(expected) = update.expected_version {
        if expected != current.version {
            return Err(DatabaseError::Conflict(format!(
                "watch list {id} is at version {}, expected {expected}",
                current.version
            )));
        }
    }

    if update.is_empty() {
        return Ok(current);
    }

    let merged = validate_new_watch_list(&merge(&current, update))?;
    let now = Utc::now();

    let written = conn
        .execute(
            "UPDATE watch_lists
             SET name = ?1, description = ?2, keywords = ?3, authorities = ?4, sectors = ?5,
                 alert_threshold = ?6, alert_enabled = ?7, version = version + 1, updated_at = ?8
             WHERE id = ?9 AND version = ?10",
            libsql::params![
                merged.name.as_str(),
                merged.description.as_deref(),
                to_json_list(&merged.criteria.keywords)?,
                to_json_list(&merged.criteria.authorities)?,
                to_json_list(&merged.criteria.sectors)?,
                merged.alert_threshold,
                i64::from(merged.alert_enabled),
                format_datetime(&now),
                id,
                current.version
            ],
        )
        .await?;
    if written == 0 {
        return Err(DatabaseError::Conflict(format!(
            "watch list {id} changed concurrently"
        )));
    }

    Ok(WatchList {
        id: current.id,
        owner_id: current.owner_id,
        name: merged.name,
        description: merged.description,
        criteria: merged.criteria,
        alert_threshold: merged.alert_threshold,
        alert_enabled: merged.alert_enabled,
        version: current.version + 1,
        created_at: current.created_at,
        updated_at: now,
    })
}

impl RegService {
    pub async fn create_watch_list(&self, input: NewWatchList) -> Result<WatchList, DatabaseError> {
        let input = validate_new_watch_list(&input)?;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_WATCH_LIST).await?;

        let keywords = to_json_list(&input.criteria.keywords)?;
        let authorities = to_json_list(&input.criteria.authorities)?;
        let sectors = to_json_list(&input.criteria.sectors)?;

        let tx = self.db().begin().await?;
        let result = tx
            .execute(
                "INSERT INTO watch_lists (id, owner_id, name, description, keywords, authorities, sectors,
                                          alert_threshold, alert_enabled, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?11)",
                libsql::params![
                    id.as_str(),
                    input.owner_id.as_str(),
                    input.name.as_str(),
                    input.description.as_deref(),
                    keywords,
                    authorities,
                    sectors,
                    input.alert_threshold,
                    i64::from(input.alert_enabled),
                    format_datetime(&now),
                    format_datetime(&now)
                ],
            )
            .await
            .map_err(DatabaseError::from);
        tx.finish(result).await?;

        tracing::debug!(watch_list = %id, owner = %input.owner_id, "watch list created");

        Ok(WatchList {
            id,
            owner_id: input.owner_id,
            name: input.name,
            description: input.description,
            criteria: input.criteria,
            alert_threshold: input.alert_threshold,
            alert_enabled: input.alert_enabled,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_watch_list(&self, id: &str) -> Result<WatchList, DatabaseError> {
        let conn = self.db().read().await;
        fetch_watch_list(&conn, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("watch_list", id))
    }

    /// All watch lists, or only those created by `owner_id`, in creation order.
    pub async fn list_watch_lists(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Vec<WatchList>, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = match owner_id {
            Some(owner) => {
                conn.query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM watch_lists WHERE owner_id = ?1 ORDER BY created_at, id"
                        ),
                        [owner],
                    )
                    .await?
            }
            None => {
                conn.query(
                        &format!("SELECT {SELECT_COLS} FROM watch_lists ORDER BY created_at, id"),
                        (),
                    )
                    .await?
            }
        };

        let mut lists = Vec::new();
        while let Some(row) = rows.next().await? {
            lists.push(row_to_watch_list(&row)?);
        }
        Ok(lists)
    }

    /// Apply a partial update. Existing match records are left as they are;
    /// new criteria only affect updates ingested afterwards.
    ///
    /// The merged list is re-validated as a whole, so clearing the last
    /// criterion is rejected.
    pub async fn update_watch_list(
        &self,
        id: &str,
        update: WatchListUpdate,
    ) -> Result<WatchList, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = update_watch_list_in(&tx, id, &update).await;
        tx.finish(result).await
    }

    /// Enable or disable alerting for a watch list.
    pub async fn set_watch_list_alerts(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<WatchList, DatabaseError> {
        self.update_watch_list(
            id,
            WatchListUpdate {
                alert_enabled: Some(enabled),
                ..WatchListUpdate::default()
            },
        )
        .await
    }

    /// Delete a watch list, its match records, and every cross-link touching it.
    /// The matched updates themselves are kept.
    pub async fn delete_watch_list(&self, id: &str) -> Result<WatchListDeletion, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            require_watch_list(&tx, id).await?;
            let matches_removed = tx
                .execute("DELETE FROM match_records WHERE watch_list_id = ?1", [id])
                .await?;
            let links_removed = delete_links_touching(&tx, EntityKind::WatchList, id).await?;
            tx.execute("DELETE FROM watch_lists WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(WatchListDeletion {
                watch_list_id: id.to_string(),
                matches_removed,
                links_removed,
            })
        }
        .await;
        let deletion = tx.finish(result).await?;

        tracing::debug!(
            watch_list = %id,
            matches = deletion.matches_removed,
            links = deletion.links_removed,
            "watch list deleted"
        );
        Ok(deletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{aml_watch_list, create_aml_list, strings, test_service};
    use crate::updates::watch_list::WatchListUpdateBuilder;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_watch_list_roundtrip() {
        let svc = test_service().await;
        let created = create_aml_list(&svc).await;

        assert!(rw_core::ids::has_prefix(&created.id, PREFIX_WATCH_LIST));
        assert_eq!(created.version, 1);
        assert!(created.alert_enabled);

        let fetched = svc.get_watch_list(&created.id).await.unwrap();
        assert_eq!(fetched.criteria, created.criteria);
        assert_eq!(fetched.name, "Sanctions desk");
        assert!((fetched.alert_threshold - 0.6).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn create_rejects_empty_criteria() {
        let svc = test_service().await;
        let mut input = aml_watch_list();
        input.criteria = WatchCriteria::default();
        let err = svc.create_watch_list(input).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(svc.list_watch_lists(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_threshold() {
        let svc = test_service().await;
        let mut input = aml_watch_list();
        input.alert_threshold = 1.5;
        let err = svc.create_watch_list(input).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn list_filters_by_owner() {
        let svc = test_service().await;
        create_aml_list(&svc).await;
        let mut other = aml_watch_list();
        other.owner_id = "usr-2".into();
        svc.create_watch_list(other).await.unwrap();

        assert_eq!(svc.list_watch_lists(None).await.unwrap().len(), 2);
        let mine = svc.list_watch_lists(Some("usr-2")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner_id, "usr-2");
    }

    #[tokio::test]
    async fn update_bumps_version_and_keeps_unset_fields() {
        let svc = test_service().await;
        let wl = create_aml_list(&svc).await;

        let updated = svc
            .update_watch_list(
                &wl.id,
                WatchListUpdateBuilder::new()
                    .name("Sanctions & AML")
                    .sectors(strings(&["Banking"]))
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(updated.version, 2);
        assert_eq!(updated.name, "Sanctions & AML");
        assert_eq!(updated.criteria.keywords, wl.criteria.keywords);
        assert_eq!(updated.criteria.sectors, strings(&["Banking"]));

        let fetched = svc.get_watch_list(&wl.id).await.unwrap();
        assert_eq!(fetched.version, 2);
        assert_eq!(fetched.criteria.sectors, strings(&["Banking"]));
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let svc = test_service().await;
        let wl = create_aml_list(&svc).await;

        svc.update_watch_list(
            &wl.id,
            WatchListUpdateBuilder::new()
                .alert_threshold(0.7)
                .expected_version(1)
                .build(),
        )
        .await
        .unwrap();

        let err = svc
            .update_watch_list(
                &wl.id,
                WatchListUpdateBuilder::new()
                    .alert_threshold(0.8)
                    .expected_version(1)
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        let fetched = svc.get_watch_list(&wl.id).await.unwrap();
        assert!((fetched.alert_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn clearing_all_criteria_is_rejected() {
        let svc = test_service().await;
        let wl = create_aml_list(&svc).await;
        let err = svc
            .update_watch_list(
                &wl.id,
                WatchListUpdateBuilder::new()
                    .keywords(vec![])
                    .authorities(vec![])
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert_eq!(svc.get_watch_list(&wl.id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn set_alerts_toggles() {
        let svc = test_service().await;
        let wl = create_aml_list(&svc).await;
        let off = svc.set_watch_list_alerts(&wl.id, false).await.unwrap();
        assert!(!off.alert_enabled);
        assert!(
            fetch_enabled_watch_lists(svc.db().raw_conn())
                .await
                .unwrap()
                .is_empty()
        );
        let on = svc.set_watch_list_alerts(&wl.id, true).await.unwrap();
        assert!(on.alert_enabled);
        assert_eq!(on.version, 3);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .update_watch_list("wl-00000000", WatchListUpdateBuilder::new().name("x").build())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let svc = test_service().await;
        let err = svc.delete_watch_list("wl-00000000").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
