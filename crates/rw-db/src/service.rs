//! Service layer hosting every repository operation.
//!
//! `RegService` wraps `RegDb` (raw database access) together with the
//! configured `Matcher` and the scoring fan-out width. All repo methods are
//! implemented as `impl RegService` blocks under `repos/`.

use rw_config::{ConfigError, RegwatchConfig};
use rw_core::matcher::Matcher;

use crate::RegDb;
use crate::error::DatabaseError;

/// Entry point for watch lists, matching, workflows and cross-links.
///
/// Every mutation follows the same protocol:
/// 1. Validate input (nothing touched yet)
/// 2. `RegDb::begin` (write lock + transaction)
/// 3. Execute SQL
/// 4. Commit on success, roll back on error
pub struct RegService {
    db: RegDb,
    matcher: Matcher,
    workers: usize,
}

impl RegService {
    /// Create a service over a local database with default matching settings.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = RegDb::open_local(db_path).await?;
        Ok(Self::from_db(db, Matcher::default(), 4))
    }

    /// Create a service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` if the matching section is invalid,
    /// or `DatabaseError` if the database cannot be opened.
    pub async fn from_config(config: &RegwatchConfig) -> Result<Self, DatabaseError> {
        let matcher = config
            .matching
            .matcher()
            .map_err(|e| match e {
                ConfigError::Matching { field, source } => {
                    DatabaseError::Validation(format!("{field}: {source}"))
                }
                other => DatabaseError::Validation(other.to_string()),
            })?;
        let db = RegDb::open_local(&config.database.path).await?;
        Ok(Self::from_db(db, matcher, config.matching.worker_count()))
    }

    /// Create from an existing `RegDb` (for testing).
    #[must_use]
    pub fn from_db(db: RegDb, matcher: Matcher, workers: usize) -> Self {
        Self {
            db,
            matcher,
            workers: workers.max(1),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &RegDb {
        &self.db
    }

    #[must_use]
    pub const fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Maximum concurrent scoring tasks.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }
}
