//! Errors raised while loading or checking Regwatch settings.

use rw_core::errors::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A TOML layer or `REGWATCH_*` variable could not be read into the schema.
    #[error("failed to load regwatch settings: {0}")]
    Figment(#[from] figment::Error),

    /// A plain field holds a value outside its range.
    #[error("invalid setting '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// The matching section does not describe a usable matcher.
    #[error("invalid matching setting '{field}'")]
    Matching {
        field: &'static str,
        #[source]
        source: CoreError,
    },
}
