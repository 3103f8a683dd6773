//! Match record repository.
//!
//! Records are created only by ingestion (and the administrative re-score) and
//! mutated only by marking them reviewed. Scores are point-in-time snapshots.

use chrono::{DateTime, Utc};

use rw_core::entities::{MatchRecord, MatchSummary};

use crate::error::DatabaseError;
use crate::helpers::{count_rows, format_datetime, get_bool, parse_datetime, parse_optional_datetime};
use crate::repos::update::update_exists;
use crate::repos::watch_list::require_watch_list;
use crate::service::RegService;

const SELECT_COLS: &str =
    "id, watch_list_id, update_id, match_score, reviewed, matched_at, reviewed_at";

fn row_to_match(row: &libsql::Row) -> Result<MatchRecord, DatabaseError> {
    Ok(MatchRecord {
        id: row.get::<String>(0)?,
        watch_list_id: row.get::<String>(1)?,
        update_id: row.get::<String>(2)?,
        match_score: row.get::<f64>(3)?,
        reviewed: get_bool(row, 4)?,
        matched_at: parse_datetime(&row.get::<String>(5)?)?,
        reviewed_at: parse_optional_datetime(row.get::<Option<String>>(6)?.as_deref())?,
    })
}

/// Narrowing options for `get_matches_for_watch_list`.
#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    /// `Some(false)` for the unreviewed inbox.
    pub reviewed: Option<bool>,
    pub min_score: Option<f64>,
    pub limit: Option<u32>,
}

/// Insert a match unless one already exists for the pair.
///
/// Returns the new record, or `None` when the pair was already matched.
pub(crate) async fn insert_match_if_absent(
    conn: &libsql::Connection,
    id: &str,
    watch_list_id: &str,
    update_id: &str,
    score: f64,
    now: DateTime<Utc>,
) -> Result<Option<MatchRecord>, DatabaseError> {
    let written = conn
        .execute(
            "INSERT INTO match_records (id, watch_list_id, update_id, match_score, reviewed, matched_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)
             ON CONFLICT(watch_list_id, update_id) DO NOTHING",
            libsql::params![id, watch_list_id, update_id, score, format_datetime(&now)],
        )
        .await?;

    Ok((written > 0).then(|| MatchRecord {
        id: id.to_string(),
        watch_list_id: watch_list_id.to_string(),
        update_id: update_id.to_string(),
        match_score: score,
        reviewed: false,
        matched_at: now,
        reviewed_at: None,
    }))
}

async fn fetch_match(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<MatchRecord>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM match_records WHERE id = ?1"),
            [id],
        )
        .await?;
    rows.next().await?.map(|row| row_to_match(&row)).transpose()
}

impl RegService {
    /// Matches of one watch list, newest first.
    ///
    /// Fails `NotFound` when the watch list does not exist, so a deleted list
    /// is distinguishable from one with no matches yet.
    pub async fn get_matches_for_watch_list(
        &self,
        watch_list_id: &str,
        filter: &MatchFilter,
    ) -> Result<Vec<MatchRecord>, DatabaseError> {
        let conn = self.db().read().await;
        require_watch_list(&conn, watch_list_id).await?;

        let mut clauses = vec!["watch_list_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![watch_list_id.into()];
        let mut idx = 2;

        if let Some(reviewed) = filter.reviewed {
            clauses.push(format!("reviewed = ?{idx}"));
            params.push(i64::from(reviewed).into());
            idx += 1;
        }
        if let Some(min_score) = filter.min_score {
            clauses.push(format!("match_score >= ?{idx}"));
            params.push(min_score.into());
            idx += 1;
        }

        let mut sql = format!(
            "SELECT {SELECT_COLS} FROM match_records WHERE {} ORDER BY matched_at DESC, match_score DESC, id",
            clauses.join(" AND ")
        );
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT ?{idx}"));
            params.push(i64::from(limit).into());
        }

        let mut rows = conn.query(&sql, libsql::params_from_iter(params)).await?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            matches.push(row_to_match(&row)?);
        }
        Ok(matches)
    }

    /// Every watch list's match for one update, highest score first.
    pub async fn get_matches_for_update(
        &self,
        update_id: &str,
    ) -> Result<Vec<MatchRecord>, DatabaseError> {
        let conn = self.db().read().await;
        if !update_exists(&conn, update_id).await? {
            return Err(DatabaseError::not_found("regulatory_update", update_id));
        }
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM match_records WHERE update_id = ?1 ORDER BY match_score DESC, id"
                ),
                [update_id],
            )
            .await?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next().await? {
            matches.push(row_to_match(&row)?);
        }
        Ok(matches)
    }

    pub async fn get_match(&self, id: &str) -> Result<MatchRecord, DatabaseError> {
        let conn = self.db().read().await;
        fetch_match(&conn, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("match_record", id))
    }

    /// Flip `reviewed` to true and stamp `reviewed_at`.
    ///
    /// Idempotent: an already-reviewed record comes back unchanged with its
    /// original `reviewed_at`.
    pub async fn mark_reviewed(&self, id: &str) -> Result<MatchRecord, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let mut record = fetch_match(&tx, id)
                .await?
                .ok_or_else(|| DatabaseError::not_found("match_record", id))?;
            if !record.reviewed {
                let now = Utc::now();
                tx.execute(
                    "UPDATE match_records SET reviewed = 1, reviewed_at = ?1 WHERE id = ?2 AND reviewed = 0",
                    libsql::params![format_datetime(&now), id],
                )
                .await?;
                record.reviewed = true;
                record.reviewed_at = Some(now);
            }
            Ok::<_, DatabaseError>(record)
        }
        .await;
        tx.finish(result).await
    }

    /// Mark every unreviewed match of a watch list reviewed. Returns how many
    /// records flipped.
    pub async fn mark_all_reviewed(&self, watch_list_id: &str) -> Result<u64, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            require_watch_list(&tx, watch_list_id).await?;
            let flipped = tx
                .execute(
                    "UPDATE match_records SET reviewed = 1, reviewed_at = ?1
                     WHERE watch_list_id = ?2 AND reviewed = 0",
                    libsql::params![format_datetime(&Utc::now()), watch_list_id],
                )
                .await?;
            Ok::<_, DatabaseError>(flipped)
        }
        .await;
        tx.finish(result).await
    }

    /// Remove one match record. The watch list and the update are untouched.
    pub async fn delete_match_record(&self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.db().begin().await?;
        let result = tx
            .execute("DELETE FROM match_records WHERE id = ?1", [id])
            .await
            .map_err(DatabaseError::from)
            .and_then(|deleted| {
                if deleted == 0 {
                    Err(DatabaseError::not_found("match_record", id))
                } else {
                    Ok(())
                }
            });
        tx.finish(result).await
    }

    pub async fn match_summary(&self, watch_list_id: &str) -> Result<MatchSummary, DatabaseError> {
        let conn = self.db().read().await;
        require_watch_list(&conn, watch_list_id).await?;
        let total = count_rows(
            &conn,
            "SELECT COUNT(*) FROM match_records WHERE watch_list_id = ?1",
            [watch_list_id],
        )
        .await?;
        let unreviewed = count_rows(
            &conn,
            "SELECT COUNT(*) FROM match_records WHERE watch_list_id = ?1 AND reviewed = 0",
            [watch_list_id],
        )
        .await?;
        Ok(MatchSummary { total, unreviewed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::update::insert_update;
    use crate::test_support::helpers::{create_aml_list, test_service, update};
    use pretty_assertions::assert_eq;

    async fn seeded() -> (RegService, String) {
        let svc = test_service().await;
        let wl = create_aml_list(&svc).await;
        for (id, day) in [("u-1", 1), ("u-2", 2), ("u-3", 3)] {
            let mut u = update(id, "FCA sanctions guidance", "FCA", &[]);
            u.published_at = crate::test_support::helpers::ts(day);
            insert_update(svc.db().raw_conn(), &u, Utc::now()).await.unwrap();
        }
        (svc, wl.id)
    }

    #[tokio::test]
    async fn insert_is_unique_per_pair() {
        let (svc, wl) = seeded().await;
        let conn = svc.db().raw_conn();
        let first = insert_match_if_absent(conn, "mat-00000001", &wl, "u-1", 0.75, Utc::now())
            .await
            .unwrap();
        let second = insert_match_if_absent(conn, "mat-00000002", &wl, "u-1", 0.9, Utc::now())
            .await
            .unwrap();
        assert!(first.is_some());
        assert!(second.is_none());

        let all = svc
            .get_matches_for_watch_list(&wl, &MatchFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert!((all[0].match_score - 0.75).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn mark_reviewed_is_idempotent() {
        let (svc, wl) = seeded().await;
        insert_match_if_absent(svc.db().raw_conn(), "mat-00000001", &wl, "u-1", 0.75, Utc::now())
            .await
            .unwrap();

        let first = svc.mark_reviewed("mat-00000001").await.unwrap();
        assert!(first.reviewed);
        let stamped = first.reviewed_at.unwrap();

        let again = svc.mark_reviewed("mat-00000001").await.unwrap();
        assert!(again.reviewed);
        assert_eq!(again.reviewed_at.unwrap().timestamp_micros(), stamped.timestamp_micros());
    }

    #[tokio::test]
    async fn mark_reviewed_missing_is_not_found() {
        let svc = test_service().await;
        let err = svc.mark_reviewed("mat-00000000").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn filters_and_summary() {
        let (svc, wl) = seeded().await;
        let conn = svc.db().raw_conn();
        insert_match_if_absent(conn, "mat-00000001", &wl, "u-1", 0.75, Utc::now()).await.unwrap();
        insert_match_if_absent(conn, "mat-00000002", &wl, "u-2", 0.65, Utc::now()).await.unwrap();
        insert_match_if_absent(conn, "mat-00000003", &wl, "u-3", 1.0, Utc::now()).await.unwrap();
        svc.mark_reviewed("mat-00000001").await.unwrap();

        let inbox = svc
            .get_matches_for_watch_list(
                &wl,
                &MatchFilter {
                    reviewed: Some(false),
                    ..MatchFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(inbox.len(), 2);

        let strong = svc
            .get_matches_for_watch_list(
                &wl,
                &MatchFilter {
                    min_score: Some(0.7),
                    limit: Some(1),
                    ..MatchFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(strong.len(), 1);

        assert_eq!(
            svc.match_summary(&wl).await.unwrap(),
            MatchSummary {
                total: 3,
                unreviewed: 2
            }
        );

        assert_eq!(svc.mark_all_reviewed(&wl).await.unwrap(), 2);
        assert_eq!(svc.mark_all_reviewed(&wl).await.unwrap(), 0);
        assert_eq!(svc.match_summary(&wl).await.unwrap().unreviewed, 0);
    }

    #[tokio::test]
    async fn delete_match_keeps_update_and_list() {
        let (svc, wl) = seeded().await;
        insert_match_if_absent(svc.db().raw_conn(), "mat-00000001", &wl, "u-1", 0.75, Utc::now())
            .await
            .unwrap();

        svc.delete_match_record("mat-00000001").await.unwrap();
        assert!(svc.get_update("u-1").await.is_ok());
        assert!(svc.get_watch_list(&wl).await.is_ok());

        let err = svc.delete_match_record("mat-00000001").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn matches_for_update() {
        let (svc, wl) = seeded().await;
        insert_match_if_absent(svc.db().raw_conn(), "mat-00000001", &wl, "u-1", 0.75, Utc::now())
            .await
            .unwrap();
        let found = svc.get_matches_for_update("u-1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(svc.get_matches_for_update("u-2").await.unwrap().is_empty());
        assert!(matches!(
            svc.get_matches_for_update("unknown").await.unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }
}
