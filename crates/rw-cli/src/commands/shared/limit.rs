use rw_config::GeneralConfig;

use crate::cli::GlobalFlags;

/// Result limit for a list command: `--limit` on the subcommand, then the
/// global `--limit`, then `general.default_limit` from config.
#[must_use]
pub fn effective_limit(local: Option<u32>, flags: &GlobalFlags, general: &GeneralConfig) -> u32 {
    local.or(flags.limit).unwrap_or(general.default_limit)
}
