use serde_json::json;

use rw_core::enums::EntityKind;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{CountsArgs, LinkArgs, LinksArgs, UnlinkArgs};
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `regwatch link`.
pub async fn handle_link(args: &LinkArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let source_type = parse_enum::<EntityKind>(&args.source_type, "source_type")?;
    let target_type = parse_enum::<EntityKind>(&args.target_type, "target_type")?;

    let link = ctx
        .service
        .link(
            source_type,
            &args.source_id,
            target_type,
            &args.target_id,
            args.notes.as_deref(),
        )
        .await?;

    output(&link, flags.format)
}

/// Handle `regwatch unlink`.
pub async fn handle_unlink(
    args: &UnlinkArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    ctx.service.unlink(&args.link_id).await?;
    output(&json!({ "unlinked": args.link_id }), flags.format)
}

/// Handle `regwatch links`.
pub async fn handle_links(args: &LinksArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let kind = parse_enum::<EntityKind>(&args.kind, "kind")?;
    let linked = ctx.service.get_linked_items_for(kind, &args.id).await?;
    output(&linked, flags.format)
}

/// Handle `regwatch counts`.
pub async fn handle_counts(
    args: &CountsArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let counts = ctx.service.get_connection_counts(&args.id).await?;
    output(&counts, flags.format)
}
