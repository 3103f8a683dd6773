use rw_config::RegwatchConfig;

use crate::cli::GlobalFlags;

/// Load `.env`, config files and `REGWATCH_*` env, then apply `--db`.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<RegwatchConfig> {
    let mut config = RegwatchConfig::load_with_dotenv()?;
    if let Some(db) = &flags.db {
        config.database.path.clone_from(db);
        config.validate()?;
    }
    Ok(config)
}
