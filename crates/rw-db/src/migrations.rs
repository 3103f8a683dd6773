//! Schema setup.
//!
//! The SQL is embedded at compile time and applied on every open. Each
//! statement is `IF NOT EXISTS`, so re-running is harmless; `user_version`
//! records the last script applied.

use crate::RegDb;
use crate::error::DatabaseError;

/// Ordered schema scripts. The position (1-based) is the schema version.
const MIGRATIONS: &[(&str, &str)] = &[("001_initial", include_str!("../migrations/001_initial.sql"))];

/// Schema version after all embedded scripts ran.
pub(crate) const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;

impl RegDb {
    /// Apply every embedded script in order and stamp `user_version`.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        for (name, sql) in MIGRATIONS {
            self.conn
                .execute_batch(sql)
                .await
                .map_err(|e| DatabaseError::Migration(format!("{name}: {e}")))?;
        }
        self.conn
            .execute(&format!("PRAGMA user_version = {SCHEMA_VERSION}"), ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("user_version: {e}")))?;
        Ok(())
    }

    /// Schema version recorded in the database file.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the pragma cannot be read.
    pub async fn schema_version(&self) -> Result<i64, DatabaseError> {
        let mut rows = self.conn.query("PRAGMA user_version", ()).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }
}
