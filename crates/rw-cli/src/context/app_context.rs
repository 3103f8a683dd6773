use std::path::Path;

use anyhow::Context;
use rw_config::RegwatchConfig;
use rw_db::service::RegService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: RegService,
    pub config: RegwatchConfig,
}

impl AppContext {
    /// Open the configured database, creating its directory if needed.
    pub async fn init(config: RegwatchConfig) -> anyhow::Result<Self> {
        if !config.database.is_in_memory() {
            if let Some(parent) = Path::new(&config.database.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let service = RegService::from_config(&config)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;

        tracing::debug!(path = %config.database.path, "regwatch store opened");
        Ok(Self { service, config })
    }
}
