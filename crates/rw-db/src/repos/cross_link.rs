//! Cross-reference graph: undirected links between tracked entities.
//!
//! A link is stored once, in canonical orientation (see
//! [`EntityRef::canonical_pair`]); lookups search both columns.

use chrono::{DateTime, Utc};

use rw_core::entities::{ConnectionCounts, CrossLink, EntityRef, LinkedItems};
use rw_core::enums::EntityKind;
use rw_core::ids::PREFIX_LINK;
use rw_core::validation::{optional_text, require_text};

use crate::error::DatabaseError;
use crate::helpers::{count_rows, format_datetime, get_opt_string, parse_datetime, parse_enum};
use crate::service::RegService;

const SELECT_COLS: &str = "id, source_type, source_id, target_type, target_id, notes, created_at";

fn row_to_link(row: &libsql::Row) -> Result<CrossLink, DatabaseError> {
    Ok(CrossLink {
        id: row.get::<String>(0)?,
        source_type: parse_enum(&row.get::<String>(1)?)?,
        source_id: row.get::<String>(2)?,
        target_type: parse_enum(&row.get::<String>(3)?)?,
        target_id: row.get::<String>(4)?,
        notes: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Fail `NotFound` when an endpoint of a kind this store owns is missing.
/// Dossiers and policies live elsewhere and are taken on trust.
async fn require_endpoint(conn: &libsql::Connection, endpoint: &EntityRef) -> Result<(), DatabaseError> {
    let (table, entity_type) = match endpoint.kind {
        EntityKind::Update => ("regulatory_updates", "regulatory_update"),
        EntityKind::WorkflowItem => ("regulatory_change_items", "regulatory_change_item"),
        EntityKind::WatchList => ("watch_lists", "watch_list"),
        EntityKind::Dossier | EntityKind::Policy => return Ok(()),
    };
    let found = count_rows(
        conn,
        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
        [endpoint.id.as_str()],
    )
    .await?;
    if found == 0 {
        return Err(DatabaseError::not_found(entity_type, endpoint.id.as_str()));
    }
    Ok(())
}

/// Put two already-validated endpoints into stored orientation.
fn orient(a: EntityRef, b: EntityRef) -> Result<(EntityRef, EntityRef), DatabaseError> {
    if a == b {
        return Err(DatabaseError::validation(format!(
            "cannot link {} {} to itself",
            a.kind, a.id
        )));
    }
    let (source, target) = EntityRef::canonical_pair(a, b);
    if !target.kind.is_link_target() {
        return Err(DatabaseError::validation(format!(
            "{} cannot be linked to another {}",
            source.kind, target.kind
        )));
    }
    Ok((source, target))
}

/// Insert one link row. Endpoints must already be in canonical orientation.
pub(crate) async fn insert_link(
    conn: &libsql::Connection,
    id: &str,
    source: &EntityRef,
    target: &EntityRef,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<CrossLink, DatabaseError> {
    let inserted = conn
        .execute(
            "INSERT INTO cross_links (id, source_type, source_id, target_type, target_id, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            libsql::params![
                id,
                source.kind.as_str(),
                source.id.as_str(),
                target.kind.as_str(),
                target.id.as_str(),
                notes,
                format_datetime(&now)
            ],
        )
        .await;
    if let Err(e) = inserted {
        let err = DatabaseError::from(e);
        if err.is_unique_violation() {
            return Err(DatabaseError::Conflict(format!(
                "{} {} is already linked to {} {}",
                source.kind, source.id, target.kind, target.id
            )));
        }
        return Err(err);
    }

    Ok(CrossLink {
        id: id.to_string(),
        source_type: source.kind,
        source_id: source.id.clone(),
        target_type: target.kind,
        target_id: target.id.clone(),
        created_at: now,
        notes: notes.map(String::from),
    })
}

/// Remove every link touching `(kind, id)`. Returns rows removed.
pub(crate) async fn delete_links_touching(
    conn: &libsql::Connection,
    kind: EntityKind,
    id: &str,
) -> Result<u64, DatabaseError> {
    let removed = conn
        .execute(
            "DELETE FROM cross_links
             WHERE (source_type = ?1 AND source_id = ?2) OR (target_type = ?1 AND target_id = ?2)",
            libsql::params![kind.as_str(), id],
        )
        .await?;
    Ok(removed)
}

impl RegService {
    /// Link two entities. Order of the arguments does not matter: `link(a, b)`
    /// and `link(b, a)` address the same connection, and the second call fails
    /// with `Conflict`.
    pub async fn link(
        &self,
        source_type: EntityKind,
        source_id: &str,
        target_type: EntityKind,
        target_id: &str,
        notes: Option<&str>,
    ) -> Result<CrossLink, DatabaseError> {
        let a = EntityRef::new(source_type, require_text("source id", source_id)?);
        let b = EntityRef::new(target_type, require_text("target id", target_id)?);
        let (source, target) = orient(a, b)?;
        let notes = optional_text(notes);
        let id = self.db().generate_id(PREFIX_LINK).await?;

        let tx = self.db().begin().await?;
        let result = async {
            require_endpoint(&tx, &source).await?;
            require_endpoint(&tx, &target).await?;
            insert_link(&tx, &id, &source, &target, notes.as_deref(), Utc::now()).await
        }
        .await;
        let link = tx.finish(result).await?;

        tracing::debug!(link = %link.id, source = %link.source_id, target = %link.target_id, "entities linked");
        Ok(link)
    }

    pub async fn unlink(&self, link_id: &str) -> Result<(), DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let removed = tx
                .execute("DELETE FROM cross_links WHERE id = ?1", [link_id])
                .await?;
            if removed == 0 {
                return Err(DatabaseError::not_found("cross_link", link_id));
            }
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }

    pub async fn get_link(&self, link_id: &str) -> Result<CrossLink, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!("SELECT {SELECT_COLS} FROM cross_links WHERE id = ?1"),
                [link_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_link(&row),
            None => Err(DatabaseError::not_found("cross_link", link_id)),
        }
    }

    /// Every link touching `(kind, id)` in either orientation, oldest first.
    pub async fn list_links_for(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> Result<Vec<CrossLink>, DatabaseError> {
        self.query_links(
            &format!(
                "SELECT {SELECT_COLS} FROM cross_links
                 WHERE (source_type = ?1 AND source_id = ?2) OR (target_type = ?1 AND target_id = ?2)
                 ORDER BY created_at, id"
            ),
            libsql::params![kind.as_str(), entity_id],
        )
        .await
    }

    /// Links of `(kind, id)` grouped by the kind on the other side.
    pub async fn get_linked_items_for(
        &self,
        kind: EntityKind,
        entity_id: &str,
    ) -> Result<LinkedItems, DatabaseError> {
        let links = self.list_links_for(kind, entity_id).await?;
        Ok(LinkedItems::collect(Some(kind), entity_id, &links))
    }

    /// Per-kind counts of everything linked to `entity_id`, whatever its kind.
    pub async fn get_connection_counts(&self, entity_id: &str) -> Result<ConnectionCounts, DatabaseError> {
        let links = self
            .query_links(
                &format!(
                    "SELECT {SELECT_COLS} FROM cross_links
                     WHERE source_id = ?1 OR target_id = ?1
                     ORDER BY created_at, id"
                ),
                [entity_id],
            )
            .await?;
        let linked = LinkedItems::collect(None, entity_id, &links);
        Ok(ConnectionCounts::from_linked(&linked))
    }

    async fn query_links(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<CrossLink>, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn.query(sql, params).await?;
        let mut links = Vec::new();
        while let Some(row) = rows.next().await? {
            links.push(row_to_link(&row)?);
        }
        Ok(links)
    }
}
