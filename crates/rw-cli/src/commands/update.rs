use std::path::Path;

use anyhow::Context;
use rw_core::entities::RegulatoryUpdate;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::UpdateCommands;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// Handle `regwatch update`.
pub async fn handle(action: &UpdateCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        UpdateCommands::Ingest { file } => {
            let updates = read_updates(Path::new(file))?;
            let report = ctx.service.ingest_batch(updates).await?;
            output(&report, flags.format)
        }
        UpdateCommands::Get { id } => {
            let update = ctx.service.get_update(id).await?;
            let matches = ctx.service.get_matches_for_update(id).await?;
            output(
                &serde_json::json!({ "update": update, "matches": matches }),
                flags.format,
            )
        }
        UpdateCommands::List { limit } => {
            let limit = effective_limit(*limit, flags, &ctx.config.general);
            let updates = ctx.service.list_updates(limit).await?;
            output(&updates, flags.format)
        }
    }
}

/// Read one `RegulatoryUpdate` per line.
fn read_updates(path: &Path) -> anyhow::Result<Vec<RegulatoryUpdate>> {
    serde_jsonlines::json_lines(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .collect::<Result<Vec<RegulatoryUpdate>, _>>()
        .with_context(|| format!("failed to parse updates from {}", path.display()))
}
