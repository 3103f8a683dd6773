//! Database error types for rw-db.

use rw_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed or missing input. Nothing was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Stale version or uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Delete or replace blocked by dependent records.
    #[error(
        "Referential integrity: {entity_type} {id} still has {dependents} dependent {dependent_type} record(s)"
    )]
    ReferentialIntegrity {
        entity_type: String,
        id: String,
        dependent_type: String,
        dependents: u64,
    },

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this is a `SQLite` UNIQUE violation surfaced by libSQL.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::LibSql(e) if e.to_string().contains("UNIQUE constraint failed"))
    }
}

impl From<CoreError> for DatabaseError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            CoreError::Conflict(msg) => Self::Conflict(msg),
            CoreError::ReferentialIntegrity {
                entity_type,
                id,
                dependent_type,
                dependents,
            } => Self::ReferentialIntegrity {
                entity_type,
                id,
                dependent_type,
                dependents,
            },
            CoreError::Other(e) => Self::Other(e),
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(err.into())
    }
}
