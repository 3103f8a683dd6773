//! Regulatory change item repository: the workflow engine.
//!
//! An item is either unassigned or sits in one named stage of its bound
//! template. Any stage may follow any other; every transition appends one
//! `stage_history` row in the same transaction that moves the item. Binding
//! or unbinding a template is not a transition and writes no history.

use chrono::{DateTime, Utc};
use serde::Serialize;

use rw_core::entities::{
    BoardColumn, NewChangeItem, RegulatoryChangeItem, StageHistoryEntry, WorkflowTemplate,
};
use rw_core::enums::{EntityKind, Priority};
use rw_core::ids::PREFIX_CHANGE_ITEM;
use rw_core::stage::StageAssignment;
use rw_core::validation::{optional_text, require_text, validate_new_change_item};

use crate::error::DatabaseError;
use crate::helpers::{
    format_datetime, get_opt_string, parse_datetime, parse_enum, parse_optional_date,
};
use crate::repos::cross_link::delete_links_touching;
use crate::repos::update::update_exists;
use crate::repos::workflow_template::require_template;
use crate::service::RegService;
use crate::updates::change_item::ChangeItemUpdate;

const SELECT_COLS: &str = "id, title, description, workflow_template_id, current_stage, priority, \
                           impact_level, due_date, authority, sector, source_update_id, version, \
                           created_at, updated_at";

fn row_to_item(row: &libsql::Row) -> Result<RegulatoryChangeItem, DatabaseError> {
    let id = row.get::<String>(0)?;
    let assignment = StageAssignment::from_columns(get_opt_string(row, 3)?, get_opt_string(row, 4)?)
        .ok_or_else(|| {
            DatabaseError::InvalidState(format!("change item {id} has a template without a stage"))
        })?;
    Ok(RegulatoryChangeItem {
        title: row.get::<String>(1)?,
        description: get_opt_string(row, 2)?,
        assignment,
        priority: parse_enum(&row.get::<String>(5)?)?,
        impact_level: parse_enum(&row.get::<String>(6)?)?,
        due_date: parse_optional_date(get_opt_string(row, 7)?.as_deref())?,
        authority: get_opt_string(row, 8)?,
        sector: get_opt_string(row, 9)?,
        source_update_id: get_opt_string(row, 10)?,
        version: row.get::<i64>(11)?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
        updated_at: parse_datetime(&row.get::<String>(13)?)?,
        id,
    })
}

fn row_to_history(row: &libsql::Row) -> Result<StageHistoryEntry, DatabaseError> {
    Ok(StageHistoryEntry {
        seq: row.get::<i64>(0)?,
        item_id: row.get::<String>(1)?,
        from_stage: get_opt_string(row, 2)?,
        stage: row.get::<String>(3)?,
        transitioned_at: parse_datetime(&row.get::<String>(4)?)?,
        notes: get_opt_string(row, 5)?,
    })
}

/// Narrowing options for `list_change_items`.
#[derive(Debug, Clone, Default)]
pub struct ChangeItemFilter {
    pub template_id: Option<String>,
    pub stage: Option<String>,
    pub priority: Option<Priority>,
    pub source_update_id: Option<String>,
    /// Only items bound to no template.
    pub unassigned: bool,
    pub limit: Option<u32>,
}

/// Result of one stage transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTransition {
    pub item: RegulatoryChangeItem,
    pub entry: StageHistoryEntry,
}

/// What `delete_change_item` removed alongside the item itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeItemDeletion {
    pub item_id: String,
    pub history_removed: u64,
    pub links_removed: u64,
}

pub(crate) async fn fetch_change_item(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<RegulatoryChangeItem>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM regulatory_change_items WHERE id = ?1"),
            [id],
        )
        .await?;
    rows.next().await?.map(|row| row_to_item(&row)).transpose()
}

pub(crate) async fn require_change_item(
    conn: &libsql::Connection,
    id: &str,
) -> Result<RegulatoryChangeItem, DatabaseError> {
    fetch_change_item(conn, id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("regulatory_change_item", id))
}

/// Insert a validated item. When `template` is given the item starts in its
/// first stage by order.
pub(crate) async fn insert_change_item(
    conn: &libsql::Connection,
    id: &str,
    input: &NewChangeItem,
    template: Option<&WorkflowTemplate>,
    now: DateTime<Utc>,
) -> Result<RegulatoryChangeItem, DatabaseError> {
    let assignment = match template {
        Some(t) => {
            let first = t.first_stage().ok_or_else(|| {
                DatabaseError::InvalidState(format!("workflow template {} has no stages", t.id))
            })?;
            StageAssignment::named(t.id.clone(), first.name.clone())
        }
        None => StageAssignment::Unassigned,
    };

    conn.execute(
        "INSERT INTO regulatory_change_items (id, title, description, workflow_template_id, current_stage,
                                              priority, impact_level, due_date, authority, sector,
                                              source_update_id, version, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?13)",
        libsql::params![
            id,
            input.title.as_str(),
            input.description.as_deref(),
            assignment.template_id(),
            assignment.stage(),
            input.priority.as_str(),
            input.impact_level.as_str(),
            input.due_date.map(|d| d.to_string()),
            input.authority.as_deref(),
            input.sector.as_deref(),
            input.source_update_id.as_deref(),
            format_datetime(&now),
            format_datetime(&now)
        ],
    )
    .await?;

    Ok(RegulatoryChangeItem {
        id: id.to_string(),
        title: input.title.clone(),
        description: input.description.clone(),
        assignment,
        priority: input.priority,
        impact_level: input.impact_level,
        due_date: input.due_date,
        authority: input.authority.clone(),
        sector: input.sector.clone(),
        source_update_id: input.source_update_id.clone(),
        version: 1,
        created_at: now,
        updated_at: now,
    })
}

/// Check the references of a validated item, then insert it.
async fn create_change_item_in(
    conn: &libsql::Connection,
    id: &str,
    input: &NewChangeItem,
) -> Result<RegulatoryChangeItem, DatabaseError> {
    let template = match input.workflow_template_id.as_deref() {
        Some(template_id) => Some(require_template(conn, template_id).await?),
        None => None,
    };
    if let Some(update_id) = input.source_update_id.as_deref() {
        if !update_exists(conn, update_id).await? {
            return Err(DatabaseError::not_found("regulatory_update", update_id));
        }
    }
    insert_change_item(conn, id, input, template.as_ref(), Utc::now()).await
}

/// Overwrite the binding columns and bump the version, guarded by `version`.
async fn write_assignment(
    conn: &libsql::Connection,
    item: &RegulatoryChangeItem,
    assignment: &StageAssignment,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let written = conn
        .execute(
            "UPDATE regulatory_change_items
             SET workflow_template_id = ?1, current_stage = ?2, version = version + 1, updated_at = ?3
             WHERE id = ?4 AND version = ?5",
            libsql::params![
                assignment.template_id(),
                assignment.stage(),
                format_datetime(&now),
                item.id.as_str(),
                item.version
            ],
        )
        .await?;
    if written == 0 {
        return Err(DatabaseError::Conflict(format!(
            "change item {} changed concurrently",
            item.id
        )));
    }
    Ok(())
}

/// Resolve a stage name against a template, ignoring case and surrounding
/// whitespace. Returns the template's spelling.
fn resolve_stage(template: &WorkflowTemplate, wanted: &str) -> Result<String, DatabaseError> {
    let wanted = wanted.trim();
    template
        .find_stage(wanted)
        .map(|s| s.name.clone())
        .ok_or_else(|| {
            DatabaseError::validation(format!(
                "'{wanted}' is not a stage of workflow template {} (stages: {})",
                template.id,
                template.stage_names().join(", ")
            ))
        })
}

async fn query_change_items(
    conn: &libsql::Connection,
    filter: &ChangeItemFilter,
) -> Result<Vec<RegulatoryChangeItem>, DatabaseError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<libsql::Value> = Vec::new();
    let mut idx = 1;

    if let Some(ref template_id) = filter.template_id {
        clauses.push(format!("workflow_template_id = ?{idx}"));
        params.push(template_id.as_str().into());
        idx += 1;
    }
    if let Some(ref stage) = filter.stage {
        clauses.push(format!("current_stage = ?{idx}"));
        params.push(stage.as_str().into());
        idx += 1;
    }
    if let Some(priority) = filter.priority {
        clauses.push(format!("priority = ?{idx}"));
        params.push(priority.as_str().into());
        idx += 1;
    }
    if let Some(ref update_id) = filter.source_update_id {
        clauses.push(format!("source_update_id = ?{idx}"));
        params.push(update_id.as_str().into());
        idx += 1;
    }
    if filter.unassigned {
        clauses.push("workflow_template_id IS NULL".to_string());
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let mut sql = format!(
        "SELECT {SELECT_COLS} FROM regulatory_change_items {where_clause} ORDER BY created_at, id"
    );
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT ?{idx}"));
        params.push(i64::from(limit).into());
    }
    let mut rows = conn.query(&sql, libsql::params_from_iter(params)).await?;
    let mut items = Vec::new();
    while let Some(row) = rows.next().await? {
        items.push(row_to_item(&row)?);
    }
    Ok(items)
}

async fn advance_in(
    conn: &libsql::Connection,
    item_id: &str,
    target_stage: &str,
    notes: Option<&str>,
    expected_version: Option<i64>,
) -> Result<StageTransition, DatabaseError> {
    let mut item = require_change_item(conn, item_id).await?;

    if let Some(expected) = expected_version {
        if expected != item.version {
            return Err(DatabaseError::Conflict(format!(
                "change item {item_id} is at version {}, expected {expected}",
                item.version
            )));
        }
    }

    let (template_id, current) = match &item.assignment {
        StageAssignment::Named { template_id, stage } => (template_id.clone(), stage.clone()),
        StageAssignment::Unassigned => {
            return Err(DatabaseError::validation(format!(
                "change item {item_id} is not bound to a workflow template"
            )));
        }
    };

    let template = require_template(conn, &template_id).await?;
    let stage = resolve_stage(&template, target_stage)?;
    if stage == current {
        return Err(DatabaseError::validation(format!(
            "change item {item_id} is already in stage '{stage}'"
        )));
    }

    let now = Utc::now();
    let assignment = StageAssignment::named(template_id, stage.clone());
    write_assignment(conn, &item, &assignment, now).await?;

    let notes = optional_text(notes);
    conn.execute(
        "INSERT INTO stage_history (item_id, from_stage, stage, transitioned_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        libsql::params![
            item_id,
            current.as_str(),
            stage.as_str(),
            format_datetime(&now),
            notes.as_deref()
        ],
    )
    .await?;
    let seq = conn.last_insert_rowid();

    item.assignment = assignment;
    item.version += 1;
    item.updated_at = now;

    Ok(StageTransition {
        item,
        entry: StageHistoryEntry {
            seq,
            item_id: item_id.to_string(),
            from_stage: Some(current),
            stage,
            transitioned_at: now,
            notes,
        },
    })
}

impl RegService {
    pub async fn create_change_item(
        &self,
        input: NewChangeItem,
    ) -> Result<RegulatoryChangeItem, DatabaseError> {
        let input = validate_new_change_item(&input)?;
        let id = self.db().generate_id(PREFIX_CHANGE_ITEM).await?;

        let tx = self.db().begin().await?;
        let result = create_change_item_in(&tx, &id, &input).await;
        let item = tx.finish(result).await?;

        tracing::debug!(item = %item.id, stage = ?item.current_stage(), "change item created");
        Ok(item)
    }

    pub async fn get_change_item(&self, id: &str) -> Result<RegulatoryChangeItem, DatabaseError> {
        require_change_item(&*self.db().read().await, id).await
    }

    /// Items matching `filter`, oldest first.
    pub async fn list_change_items(
        &self,
        filter: &ChangeItemFilter,
    ) -> Result<Vec<RegulatoryChangeItem>, DatabaseError> {
        query_change_items(&*self.db().read().await, filter).await
    }

    /// Edit descriptive fields. Stage and template binding are not editable
    /// here.
    pub async fn update_change_item(
        &self,
        item_id: &str,
        update: ChangeItemUpdate,
    ) -> Result<RegulatoryChangeItem, DatabaseError> {
        let title = update
            .title
            .as_deref()
            .map(|t| require_text("title", t))
            .transpose()?;

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        let mut idx = 1;

        if let Some(ref title) = title {
            sets.push(format!("title = ?{idx}"));
            params.push(title.as_str().into());
            idx += 1;
        }
        if let Some(ref description) = update.description {
            sets.push(format!("description = ?{idx}"));
            params.push(optional_text(description.as_deref()).map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(priority) = update.priority {
            sets.push(format!("priority = ?{idx}"));
            params.push(priority.as_str().into());
            idx += 1;
        }
        if let Some(impact) = update.impact_level {
            sets.push(format!("impact_level = ?{idx}"));
            params.push(impact.as_str().into());
            idx += 1;
        }
        if let Some(due_date) = update.due_date {
            sets.push(format!("due_date = ?{idx}"));
            params.push(due_date.map_or(libsql::Value::Null, |d| d.to_string().into()));
            idx += 1;
        }
        if let Some(ref authority) = update.authority {
            sets.push(format!("authority = ?{idx}"));
            params.push(optional_text(authority.as_deref()).map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }
        if let Some(ref sector) = update.sector {
            sets.push(format!("sector = ?{idx}"));
            params.push(optional_text(sector.as_deref()).map_or(libsql::Value::Null, Into::into));
            idx += 1;
        }

        let tx = self.db().begin().await?;
        let result = async {
            let current = require_change_item(&tx, item_id).await?;
            if let Some(expected) = update.expected_version {
                if expected != current.version {
                    return Err(DatabaseError::Conflict(format!(
                        "change item {item_id} is at version {}, expected {expected}",
                        current.version
                    )));
                }
            }
            if sets.is_empty() {
                return Ok(current);
            }

            let mut sets = sets;
            let mut params = params;
            sets.push("version = version + 1".to_string());
            sets.push(format!("updated_at = ?{idx}"));
            params.push(format_datetime(&Utc::now()).into());
            let id_idx = idx + 1;
            let version_idx = idx + 2;
            params.push(item_id.into());
            params.push(current.version.into());

            let sql = format!(
                "UPDATE regulatory_change_items SET {} WHERE id = ?{id_idx} AND version = ?{version_idx}",
                sets.join(", ")
            );
            let written = tx.execute(&sql, libsql::params_from_iter(params)).await?;
            if written == 0 {
                return Err(DatabaseError::Conflict(format!(
                    "change item {item_id} changed concurrently"
                )));
            }
            require_change_item(&tx, item_id).await
        }
        .await;
        tx.finish(result).await
    }

    /// Delete an item with its stage history and every cross-link touching it.
    pub async fn delete_change_item(&self, item_id: &str) -> Result<ChangeItemDeletion, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            require_change_item(&tx, item_id).await?;
            let history_removed = tx
                .execute("DELETE FROM stage_history WHERE item_id = ?1", [item_id])
                .await?;
            let links_removed = delete_links_touching(&tx, EntityKind::WorkflowItem, item_id).await?;
            tx.execute("DELETE FROM regulatory_change_items WHERE id = ?1", [item_id])
                .await?;
            Ok::<_, DatabaseError>(ChangeItemDeletion {
                item_id: item_id.to_string(),
                history_removed,
                links_removed,
            })
        }
        .await;
        tx.finish(result).await
    }

    /// Bind an item to a template, placing it in the template's first stage.
    ///
    /// Re-assigning the template the item is already bound to leaves it where
    /// it is. No history is written.
    pub async fn assign_template(
        &self,
        item_id: &str,
        template_id: &str,
    ) -> Result<RegulatoryChangeItem, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let mut item = require_change_item(&tx, item_id).await?;
            let template = require_template(&tx, template_id).await?;
            if item.workflow_template_id() == Some(template_id) {
                return Ok(item);
            }
            let first = template.first_stage().ok_or_else(|| {
                DatabaseError::InvalidState(format!("workflow template {template_id} has no stages"))
            })?;
            let assignment = StageAssignment::named(template_id, first.name.clone());
            let now = Utc::now();
            write_assignment(&tx, &item, &assignment, now).await?;
            item.assignment = assignment;
            item.version += 1;
            item.updated_at = now;
            Ok::<_, DatabaseError>(item)
        }
        .await;
        tx.finish(result).await
    }

    /// Return an item to the unassigned state. History is kept.
    pub async fn unassign_template(&self, item_id: &str) -> Result<RegulatoryChangeItem, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let mut item = require_change_item(&tx, item_id).await?;
            if !item.assignment.is_assigned() {
                return Ok(item);
            }
            let now = Utc::now();
            write_assignment(&tx, &item, &StageAssignment::Unassigned, now).await?;
            item.assignment = StageAssignment::Unassigned;
            item.version += 1;
            item.updated_at = now;
            Ok::<_, DatabaseError>(item)
        }
        .await;
        tx.finish(result).await
    }

    /// Move an item to `stage` of its bound template and record the transition.
    ///
    /// Fails `Validation` when the item is unassigned, the stage does not
    /// belong to the template, or the item is already there; nothing is
    /// appended in those cases. Runs under the write lock, so concurrent
    /// advances of the same item serialize.
    pub async fn advance_item(
        &self,
        item_id: &str,
        stage: &str,
        notes: Option<&str>,
    ) -> Result<StageTransition, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = advance_in(&tx, item_id, stage, notes, None).await;
        let transition = tx.finish(result).await?;
        tracing::debug!(
            item = %item_id,
            from = ?transition.entry.from_stage,
            to = %transition.entry.stage,
            "change item advanced"
        );
        Ok(transition)
    }

    /// `advance_item` that fails `Conflict` unless the item is still at
    /// `expected_version`.
    pub async fn advance_item_if_version(
        &self,
        item_id: &str,
        stage: &str,
        notes: Option<&str>,
        expected_version: i64,
    ) -> Result<StageTransition, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = advance_in(&tx, item_id, stage, notes, Some(expected_version)).await;
        tx.finish(result).await
    }

    /// Transitions of one item in chronological order.
    pub async fn stage_history(&self, item_id: &str) -> Result<Vec<StageHistoryEntry>, DatabaseError> {
        let conn = self.db().read().await;
        require_change_item(&conn, item_id).await?;
        let mut rows = conn
            .query(
                "SELECT seq, item_id, from_stage, stage, transitioned_at, notes
                 FROM stage_history WHERE item_id = ?1 ORDER BY transitioned_at, seq",
                [item_id],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_history(&row)?);
        }
        Ok(entries)
    }

    /// Kanban view: one column per stage in order, each holding the items
    /// currently in it.
    pub async fn board(&self, template_id: &str) -> Result<Vec<BoardColumn>, DatabaseError> {
        let (template, items) = {
            let conn = self.db().read().await;
            let template = require_template(&conn, template_id).await?;
            let items = query_change_items(
                &conn,
                &ChangeItemFilter {
                    template_id: Some(template_id.to_string()),
                    ..ChangeItemFilter::default()
                },
            )
            .await?;
            (template, items)
        };

        let mut stages = template.stages;
        stages.sort_by_key(|s| s.order);
        let mut columns: Vec<BoardColumn> = stages
            .into_iter()
            .map(|stage| BoardColumn {
                stage,
                items: Vec::new(),
            })
            .collect();

        for item in items {
            let Some(stage) = item.current_stage().map(str::to_string) else {
                continue;
            };
            match columns.iter_mut().find(|c| c.stage.name == stage) {
                Some(column) => column.items.push(item),
                None => tracing::warn!(item = %item.id, %stage, "item sits in a stage its template no longer has"),
            }
        }
        Ok(columns)
    }
}
