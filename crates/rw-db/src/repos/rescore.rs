//! Administrative re-score sweep.
//!
//! Adds match records that current criteria would produce for updates already
//! in the store. Existing records are never rescored or removed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;

use rw_core::entities::RegulatoryUpdate;
use rw_core::ids::PREFIX_MATCH;

use crate::error::DatabaseError;
use crate::helpers::generate_id_on;
use crate::repos::ingest::score_fan_out;
use crate::repos::match_record::insert_match_if_absent;
use crate::repos::update::fetch_all_updates;
use crate::repos::watch_list::{fetch_enabled_watch_lists, fetch_watch_list};
use crate::service::RegService;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RescoreReport {
    /// Enabled watch lists when the sweep started.
    pub watch_lists_total: usize,
    /// Watch lists whose transaction committed.
    pub watch_lists_scored: usize,
    pub matches_created: usize,
    pub cancelled: bool,
}

impl RegService {
    /// Score one watch list against `updates` and insert what is missing.
    /// Lists deleted or disabled since the sweep started are skipped.
    async fn rescore_watch_list(
        &self,
        conn: &libsql::Connection,
        watch_list_id: &str,
        updates: Arc<Vec<RegulatoryUpdate>>,
    ) -> Result<usize, DatabaseError> {
        let Some(list) = fetch_watch_list(conn, watch_list_id).await? else {
            return Ok(0);
        };
        if !list.alert_enabled {
            return Ok(0);
        }

        let candidates =
            score_fan_out(*self.matcher(), self.workers(), Arc::new(vec![list]), updates).await?;
        let now = Utc::now();
        let mut created = 0;
        for candidate in candidates {
            let id = generate_id_on(conn, PREFIX_MATCH).await?;
            let inserted = insert_match_if_absent(
                conn,
                &id,
                &candidate.watch_list_id,
                &candidate.update_id,
                candidate.score,
                now,
            )
            .await?;
            if inserted.is_some() {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Re-score every enabled watch list against every stored update, one
    /// watch list per transaction.
    ///
    /// `cancel` is checked before each watch list. A cancelled sweep keeps the
    /// watch lists it already committed and reports `cancelled = true`.
    pub async fn rescore_all(&self, cancel: &AtomicBool) -> Result<RescoreReport, DatabaseError> {
        self.rescore_all_with_progress(cancel, |_, _| {}).await
    }

    /// [`RegService::rescore_all`] that calls `on_committed(watch_list_id,
    /// matches_created)` after each watch list's transaction commits.
    pub async fn rescore_all_with_progress<F>(
        &self,
        cancel: &AtomicBool,
        mut on_committed: F,
    ) -> Result<RescoreReport, DatabaseError>
    where
        F: FnMut(&str, usize),
    {
        let (lists, updates) = {
            let conn = self.db().read().await;
            let lists = fetch_enabled_watch_lists(&conn).await?;
            let updates = fetch_all_updates(&conn).await?;
            (lists, Arc::new(updates))
        };

        let mut report = RescoreReport {
            watch_lists_total: lists.len(),
            ..RescoreReport::default()
        };

        for list in &lists {
            if cancel.load(Ordering::Relaxed) {
                report.cancelled = true;
                tracing::debug!(
                    scored = report.watch_lists_scored,
                    total = report.watch_lists_total,
                    "rescore cancelled"
                );
                break;
            }

            let tx = self.db().begin().await?;
            let result = self.rescore_watch_list(&tx, &list.id, Arc::clone(&updates)).await;
            let created = tx.finish(result).await?;

            tracing::debug!(watch_list = %list.id, created, "watch list rescored");
            report.watch_lists_scored += 1;
            report.matches_created += created;
            on_committed(&list.id, created);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::match_record::MatchFilter;
    use crate::test_support::helpers::{aml_watch_list, create_aml_list, test_service, update};
    use crate::updates::watch_list::WatchListUpdateBuilder;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn rescore_backfills_lists_created_later() {
        let svc = test_service().await;
        svc.ingest_update(update("fca-1", "FCA sanctions guidance", "FCA", &["Banking"]))
            .await
            .unwrap();
        let list = create_aml_list(&svc).await;
        assert!(svc
            .get_matches_for_watch_list(&list.id, &MatchFilter::default())
            .await
            .unwrap()
            .is_empty());

        let report = svc.rescore_all(&AtomicBool::new(false)).await.unwrap();
        assert_eq!(report.watch_lists_total, 1);
        assert_eq!(report.watch_lists_scored, 1);
        assert_eq!(report.matches_created, 1);
        assert!(!report.cancelled);

        let again = svc.rescore_all(&AtomicBool::new(false)).await.unwrap();
        assert_eq!(again.matches_created, 0);
    }

    #[tokio::test]
    async fn existing_records_keep_their_snapshot() {
        let svc = test_service().await;
        let list = create_aml_list(&svc).await;
        let created = svc
            .ingest_update(update("fca-1", "FCA sanctions guidance", "FCA", &[]))
            .await
            .unwrap();
        svc.mark_reviewed(&created[0].id).await.unwrap();

        // Tighter criteria would no longer match, and would score differently.
        svc.update_watch_list(
            &list.id,
            WatchListUpdateBuilder::new().alert_threshold(0.9).build(),
        )
        .await
        .unwrap();
        svc.rescore_all(&AtomicBool::new(false)).await.unwrap();

        let record = svc.get_match(&created[0].id).await.unwrap();
        assert!(record.reviewed);
        assert!((record.match_score - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn cancelled_before_start_scores_nothing() {
        let svc = test_service().await;
        svc.ingest_update(update("fca-1", "FCA sanctions guidance", "FCA", &[]))
            .await
            .unwrap();
        create_aml_list(&svc).await;

        let report = svc.rescore_all(&AtomicBool::new(true)).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.watch_lists_total, 1);
        assert_eq!(report.watch_lists_scored, 0);
        assert_eq!(report.matches_created, 0);
    }

    #[tokio::test]
    async fn cancelled_mid_sweep_keeps_whole_lists() {
        let svc = test_service().await;
        for (id, headline) in [
            ("fca-1", "FCA sanctions guidance"),
            ("fca-2", "FCA AML sanctions update"),
            ("fca-3", "FCA AML reporting"),
        ] {
            svc.ingest_update(update(id, headline, "FCA", &["Banking"]))
                .await
                .unwrap();
        }
        let first = create_aml_list(&svc).await;
        let second = create_aml_list(&svc).await;

        let cancel = AtomicBool::new(false);
        let mut committed = Vec::new();
        let report = svc
            .rescore_all_with_progress(&cancel, |watch_list_id, created| {
                committed.push((watch_list_id.to_string(), created));
                cancel.store(true, Ordering::Relaxed);
            })
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.watch_lists_total, 2);
        assert_eq!(report.watch_lists_scored, 1);
        assert_eq!(report.matches_created, 3);
        assert_eq!(committed.len(), 1);
        let (scored, created) = committed[0].clone();
        assert_eq!(created, 3);
        let untouched = if scored == first.id { &second.id } else { &first.id };

        assert_eq!(svc.match_summary(&scored).await.unwrap().total, 3);
        assert_eq!(svc.match_summary(untouched).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn disabled_lists_are_not_swept() {
        let svc = test_service().await;
        svc.ingest_update(update("fca-1", "FCA sanctions guidance", "FCA", &[]))
            .await
            .unwrap();
        let mut disabled = aml_watch_list();
        disabled.alert_enabled = false;
        let list = svc.create_watch_list(disabled).await.unwrap();

        let report = svc.rescore_all(&AtomicBool::new(false)).await.unwrap();
        assert_eq!(report.watch_lists_total, 0);
        assert_eq!(svc.match_summary(&list.id).await.unwrap().total, 0);
    }
}
