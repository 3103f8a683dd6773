//! Ingestion-time matching and the create-item-from-update composite.
//!
//! Scoring is pure and runs on a bounded `JoinSet` fan-out; only the merge
//! (match inserts) touches the database, inside the caller's transaction.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use rw_core::entities::{
    CrossLink, EntityRef, MatchRecord, NewChangeItem, RegulatoryChangeItem, RegulatoryUpdate,
    WatchList,
};
use rw_core::enums::EntityKind;
use rw_core::ids::{PREFIX_CHANGE_ITEM, PREFIX_LINK, PREFIX_MATCH};
use rw_core::matcher::Matcher;
use rw_core::validation::{validate_new_change_item, validate_update};

use crate::error::DatabaseError;
use crate::helpers::generate_id_on;
use crate::repos::change_item::insert_change_item;
use crate::repos::cross_link::insert_link;
use crate::repos::match_record::insert_match_if_absent;
use crate::repos::update::insert_update;
use crate::repos::watch_list::fetch_enabled_watch_lists;
use crate::repos::workflow_template::require_template;
use crate::service::RegService;

/// Outcome of `ingest_batch`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    pub updates_seen: usize,
    /// Updates whose id was not stored before. Only these are matched.
    pub updates_new: usize,
    pub matches_created: usize,
    pub matches: Vec<MatchRecord>,
}

/// Outcome of `create_change_item_from_update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFromUpdate {
    pub item: RegulatoryChangeItem,
    pub link: CrossLink,
    /// Matches created because the update was new to the store.
    pub matches: Vec<MatchRecord>,
}

/// A (watch list, update) pair that reached the list's threshold.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    pub watch_list_id: String,
    pub update_id: String,
    pub score: f64,
}

/// Score every (update, watch list) pair on at most `workers` tasks.
///
/// Candidates come back ordered by update, then by watch list, whatever order
/// the tasks finish in. A panicked task fails the whole sweep.
pub(crate) async fn score_fan_out(
    matcher: Matcher,
    workers: usize,
    watch_lists: Arc<Vec<WatchList>>,
    updates: Arc<Vec<RegulatoryUpdate>>,
) -> Result<Vec<Candidate>, DatabaseError> {
    let total = watch_lists.len() * updates.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let chunk = total.div_ceil(workers.max(1));

    let mut set = tokio::task::JoinSet::new();
    for (slot, start) in (0..total).step_by(chunk).enumerate() {
        let end = (start + chunk).min(total);
        let lists = Arc::clone(&watch_lists);
        let batch = Arc::clone(&updates);
        set.spawn(async move {
            let mut found = Vec::new();
            for pair in start..end {
                let update = &batch[pair / lists.len()];
                let list = &lists[pair % lists.len()];
                if let Some(score) = matcher.evaluate(update, &list.criteria, list.alert_threshold) {
                    found.push(Candidate {
                        watch_list_id: list.id.clone(),
                        update_id: update.id.clone(),
                        score,
                    });
                }
            }
            (slot, found)
        });
    }

    let mut slots: Vec<Vec<Candidate>> = vec![Vec::new(); total.div_ceil(chunk)];
    while let Some(res) = set.join_next().await {
        match res {
            Ok((slot, found)) => slots[slot] = found,
            Err(e) => {
                tracing::warn!(%e, "scoring task failed");
                return Err(DatabaseError::Other(anyhow::anyhow!("scoring task failed: {e}")));
            }
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

/// Reject the whole batch if any update is malformed, and drop repeated ids
/// (first occurrence wins).
fn validate_batch(updates: &[RegulatoryUpdate]) -> Result<Vec<RegulatoryUpdate>, DatabaseError> {
    let mut seen = HashSet::with_capacity(updates.len());
    let mut valid = Vec::with_capacity(updates.len());
    for update in updates {
        let update = validate_update(update)?;
        if seen.insert(update.id.clone()) {
            valid.push(update);
        }
    }
    Ok(valid)
}

impl RegService {
    /// Persist `updates` and match the new ones against every enabled watch
    /// list. Runs against `conn`, which must be an open write transaction.
    async fn ingest_in(
        &self,
        conn: &libsql::Connection,
        updates: Vec<RegulatoryUpdate>,
    ) -> Result<(usize, Vec<MatchRecord>), DatabaseError> {
        let now = Utc::now();
        let mut fresh = Vec::new();
        for update in updates {
            if insert_update(conn, &update, now).await? {
                fresh.push(update);
            } else {
                tracing::debug!(update = %update.id, "update already stored; not re-matched");
            }
        }
        let updates_new = fresh.len();
        if fresh.is_empty() {
            return Ok((0, Vec::new()));
        }

        let lists = fetch_enabled_watch_lists(conn).await?;
        let candidates = score_fan_out(
            *self.matcher(),
            self.workers(),
            Arc::new(lists),
            Arc::new(fresh),
        )
        .await?;

        let mut created = Vec::new();
        for candidate in candidates {
            let id = generate_id_on(conn, PREFIX_MATCH).await?;
            if let Some(record) = insert_match_if_absent(
                conn,
                &id,
                &candidate.watch_list_id,
                &candidate.update_id,
                candidate.score,
                now,
            )
            .await?
            {
                created.push(record);
            }
        }
        Ok((updates_new, created))
    }

    /// Ingest one update and return the match records it created.
    ///
    /// An update id that is already stored is left untouched and yields no
    /// matches.
    pub async fn ingest_update(
        &self,
        update: RegulatoryUpdate,
    ) -> Result<Vec<MatchRecord>, DatabaseError> {
        Ok(self.ingest_batch(vec![update]).await?.matches)
    }

    /// Ingest many updates in one transaction. Any invalid update rejects the
    /// batch before anything is written.
    pub async fn ingest_batch(
        &self,
        updates: Vec<RegulatoryUpdate>,
    ) -> Result<IngestReport, DatabaseError> {
        let updates_seen = updates.len();
        let updates = validate_batch(&updates)?;

        let tx = self.db().begin().await?;
        let result = self.ingest_in(&tx, updates).await;
        let (updates_new, matches) = tx.finish(result).await?;

        tracing::debug!(
            seen = updates_seen,
            new = updates_new,
            matches = matches.len(),
            "ingest complete"
        );
        Ok(IngestReport {
            updates_seen,
            updates_new,
            matches_created: matches.len(),
            matches,
        })
    }

    /// Open a change item for `update` on `template_id`'s first stage and link
    /// the two.
    ///
    /// The update is stored (and matched) first if it is new. All of it
    /// commits together or not at all.
    pub async fn create_change_item_from_update(
        &self,
        update: &RegulatoryUpdate,
        template_id: &str,
    ) -> Result<ItemFromUpdate, DatabaseError> {
        let update = validate_update(update)?;
        let input = validate_new_change_item(&NewChangeItem {
            title: update.headline.clone(),
            description: Some(update.summary.clone()).filter(|s| !s.is_empty()),
            workflow_template_id: Some(template_id.to_string()),
            authority: Some(update.authority.clone()),
            sector: update.sectors.first().cloned(),
            source_update_id: Some(update.id.clone()),
            ..NewChangeItem::default()
        })?;
        let item_id = self.db().generate_id(PREFIX_CHANGE_ITEM).await?;
        let link_id = self.db().generate_id(PREFIX_LINK).await?;

        let tx = self.db().begin().await?;
        let result = async {
            let template = require_template(&tx, template_id).await?;
            let source = EntityRef::new(EntityKind::Update, update.id.as_str());
            let (_, matches) = self.ingest_in(&tx, vec![update]).await?;
            let now = Utc::now();
            let item = insert_change_item(&tx, &item_id, &input, Some(&template), now).await?;
            let target = EntityRef::new(EntityKind::WorkflowItem, item.id.as_str());
            let link = insert_link(&tx, &link_id, &source, &target, None, now).await?;
            Ok::<_, DatabaseError>(ItemFromUpdate {
                item,
                link,
                matches,
            })
        }
        .await;
        let created = tx.finish(result).await?;

        tracing::debug!(
            item = %created.item.id,
            update = %created.link.source_id,
            "change item opened from update"
        );
        Ok(created)
    }
}
