//! Relevance-matching configuration.

use rw_core::enums::KeywordMode;
use rw_core::matcher::{DEFAULT_PRECISION, Matcher, ScoringWeights};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_keyword_weight() -> f64 {
    0.5
}

const fn default_authority_weight() -> f64 {
    0.25
}

const fn default_sector_weight() -> f64 {
    0.25
}

const fn default_precision() -> u32 {
    DEFAULT_PRECISION
}

/// Default size of the scoring fan-out during ingestion.
const fn default_workers() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,

    #[serde(default = "default_authority_weight")]
    pub authority_weight: f64,

    #[serde(default = "default_sector_weight")]
    pub sector_weight: f64,

    /// Decimal places kept in a stored score.
    #[serde(default = "default_precision")]
    pub score_precision: u32,

    /// `substring` or `whole_word`.
    #[serde(default)]
    pub keyword_mode: KeywordMode,

    /// Maximum concurrent scoring tasks per ingestion sweep.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            keyword_weight: default_keyword_weight(),
            authority_weight: default_authority_weight(),
            sector_weight: default_sector_weight(),
            score_precision: default_precision(),
            keyword_mode: KeywordMode::default(),
            workers: default_workers(),
        }
    }
}

impl MatchingConfig {
    /// Build the matcher these settings describe.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Matching` if the weights do not form a valid
    /// distribution or the precision is out of range.
    pub fn matcher(&self) -> Result<Matcher, ConfigError> {
        let weights = ScoringWeights::new(
            self.keyword_weight,
            self.authority_weight,
            self.sector_weight,
        )
        .map_err(|source| ConfigError::Matching {
            field: "matching.*_weight",
            source,
        })?;

        Matcher::new(weights, self.score_precision, self.keyword_mode).map_err(|source| {
            ConfigError::Matching {
                field: "matching.score_precision",
                source,
            }
        })
    }

    /// Worker count, never below one.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}
