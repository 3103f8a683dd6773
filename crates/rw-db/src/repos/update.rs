//! Regulatory update repository: append-only storage.
//!
//! Updates are never mutated after their first write. Re-inserting a known id
//! leaves the stored row untouched.

use chrono::{DateTime, Utc};

use rw_core::entities::RegulatoryUpdate;

use crate::error::DatabaseError;
use crate::helpers::{count_rows, format_datetime, parse_datetime, parse_json_list, to_json_list};
use crate::service::RegService;

const SELECT_COLS: &str = "id, headline, summary, authority, sectors, tags, published_at";

fn row_to_update(row: &libsql::Row) -> Result<RegulatoryUpdate, DatabaseError> {
    Ok(RegulatoryUpdate {
        id: row.get::<String>(0)?,
        headline: row.get::<String>(1)?,
        summary: row.get::<String>(2)?,
        authority: row.get::<String>(3)?,
        sectors: parse_json_list(&row.get::<String>(4)?)?,
        tags: parse_json_list(&row.get::<String>(5)?)?,
        published_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

/// Store `update` unless its id is already known. Returns whether a row was
/// written.
pub(crate) async fn insert_update(
    conn: &libsql::Connection,
    update: &RegulatoryUpdate,
    now: DateTime<Utc>,
) -> Result<bool, DatabaseError> {
    let written = conn
        .execute(
            "INSERT INTO regulatory_updates (id, headline, summary, authority, sectors, tags, published_at, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO NOTHING",
            libsql::params![
                update.id.as_str(),
                update.headline.as_str(),
                update.summary.as_str(),
                update.authority.as_str(),
                to_json_list(&update.sectors)?,
                to_json_list(&update.tags)?,
                format_datetime(&update.published_at),
                format_datetime(&now)
            ],
        )
        .await?;
    Ok(written > 0)
}

pub(crate) async fn fetch_update(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<RegulatoryUpdate>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM regulatory_updates WHERE id = ?1"),
            [id],
        )
        .await?;
    rows.next().await?.map(|row| row_to_update(&row)).transpose()
}

pub(crate) async fn update_exists(conn: &libsql::Connection, id: &str) -> Result<bool, DatabaseError> {
    Ok(count_rows(conn, "SELECT COUNT(*) FROM regulatory_updates WHERE id = ?1", [id]).await? > 0)
}

/// Every stored update, oldest publication first.
pub(crate) async fn fetch_all_updates(
    conn: &libsql::Connection,
) -> Result<Vec<RegulatoryUpdate>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM regulatory_updates ORDER BY published_at, id"),
            (),
        )
        .await?;
    let mut updates = Vec::new();
    while let Some(row) = rows.next().await? {
        updates.push(row_to_update(&row)?);
    }
    Ok(updates)
}

impl RegService {
    pub async fn get_update(&self, id: &str) -> Result<RegulatoryUpdate, DatabaseError> {
        let conn = self.db().read().await;
        fetch_update(&conn, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("regulatory_update", id))
    }

    /// Most recently published updates first.
    pub async fn list_updates(&self, limit: u32) -> Result<Vec<RegulatoryUpdate>, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM regulatory_updates ORDER BY published_at DESC, id LIMIT ?1"
                ),
                [i64::from(limit)],
            )
            .await?;
        let mut updates = Vec::new();
        while let Some(row) = rows.next().await? {
            updates.push(row_to_update(&row)?);
        }
        Ok(updates)
    }
}
