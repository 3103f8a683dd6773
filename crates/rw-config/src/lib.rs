//! # rw-config
//!
//! Layered configuration loading for Regwatch using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`REGWATCH_*` prefix, `__` as separator)
//! 2. Project-level `.regwatch/config.toml`
//! 3. User-level `~/.config/regwatch/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `REGWATCH_DATABASE__PATH` -> `database.path`,
//! `REGWATCH_MATCHING__KEYWORD_WEIGHT` -> `matching.keyword_weight`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use rw_config::RegwatchConfig;
//!
//! let config = RegwatchConfig::load_with_dotenv().expect("config");
//! let matcher = config.matching.matcher().expect("valid weights");
//! println!("store: {}", config.database.path);
//! ```

mod database;
mod error;
mod general;
mod matching;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use matching::MatchingConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegwatchConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl RegwatchConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env`
    /// file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load from a single explicit TOML file layered over defaults and env.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or a value is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("REGWATCH_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".regwatch/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("REGWATCH_").split("__"))
    }

    /// Cross-field checks that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty database path, or
    /// `ConfigError::Matching` when the matching section does not build a matcher.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        self.matching.matcher()?;
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("regwatch").join("config.toml"))
    }
}
