//! # rw-db
//!
//! libSQL storage for Regwatch.
//!
//! Holds every persisted collection: regulatory updates, watch lists and their
//! match records, workflow templates, change items with their stage history,
//! and the cross-reference link ledger. `RegService` hosts the repository
//! methods; `RegDb` owns the connection, migrations, ID generation and the
//! single write gate that serializes mutations.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29).

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use std::ops::Deref;

use error::DatabaseError;
use libsql::Builder;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Central database handle for all Regwatch state.
///
/// Wraps a libSQL database and connection. Writes go through
/// [`RegDb::begin`] and reads through [`RegDb::read`]; both share one gate,
/// so a reader never observes a transaction that has not committed.
pub struct RegDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    gate: RwLock<()>,
}

/// Shared access to the connection for reads.
///
/// Held for as long as a query's rows are consumed. Do not take a second
/// `ReadConn` while holding one: a queued writer would block it.
pub struct ReadConn<'a> {
    conn: &'a libsql::Connection,
    _guard: RwLockReadGuard<'a, ()>,
}

impl Deref for ReadConn<'_> {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
    }
}

/// An open write transaction holding the store's write lock.
///
/// Derefs to the libSQL connection so repository helpers take a plain
/// `&libsql::Connection` whether or not they run inside a transaction.
/// Dropping without [`WriteTxn::commit`] rolls back.
pub struct WriteTxn<'a> {
    tx: libsql::Transaction,
    _guard: RwLockWriteGuard<'a, ()>,
}

impl Deref for WriteTxn<'_> {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        &*self.tx
    }
}

impl WriteTxn<'_> {
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the commit fails.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the rollback fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Commit when `result` is `Ok`, roll back otherwise, and hand `result` back.
    ///
    /// A rollback failure is logged; the original error is what the caller sees.
    ///
    /// # Errors
    ///
    /// Returns the error carried by `result`, or the commit error.
    pub async fn finish<T>(self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::warn!(%rollback_err, "rollback failed after error: {e}");
                }
                Err(e)
            }
        }
    }
}

impl RegDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let reg_db = Self {
            db,
            conn,
            gate: RwLock::new(()),
        };
        reg_db.run_migrations().await?;
        Ok(reg_db)
    }

    /// Wait until no write transaction is open and take shared read access.
    pub async fn read(&self) -> ReadConn<'_> {
        ReadConn {
            conn: &self.conn,
            _guard: self.gate.read().await,
        }
    }

    /// The connection without the gate, for fixtures that seed rows directly.
    #[cfg(test)]
    pub(crate) const fn raw_conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Take the write lock and open a transaction.
    ///
    /// Concurrent writers queue on the lock, so read-modify-write sequences
    /// inside one `WriteTxn` never interleave, and readers wait for it to
    /// commit or roll back.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::LibSql` if the transaction cannot be started.
    pub async fn begin(&self) -> Result<WriteTxn<'_>, DatabaseError> {
        let guard = self.gate.write().await;
        let tx = self.conn.transaction().await?;
        Ok(WriteTxn { tx, _guard: guard })
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"wl-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    /// Inside a transaction use [`helpers::generate_id_on`] with the `WriteTxn`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        helpers::generate_id_on(&*self.read().await, prefix).await
    }
}
