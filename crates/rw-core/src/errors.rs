//! Cross-cutting error types for Regwatch.
//!
//! This module defines errors that can originate from any crate in the system.
//! Storage-specific errors (`DatabaseError`) live in `rw-db`, which converts
//! from `CoreError` so the four domain categories survive the trip to the caller.

use thiserror::Error;

/// Errors that can be raised by any Regwatch crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or missing input. Raised before any mutation happens.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Concurrent modification or uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A delete or replace was blocked by dependent records.
    #[error(
        "Referential integrity: {entity_type} {id} still has {dependents} dependent {dependent_type} record(s)"
    )]
    ReferentialIntegrity {
        entity_type: String,
        id: String,
        dependent_type: String,
        dependents: u64,
    },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for a `Validation` error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
