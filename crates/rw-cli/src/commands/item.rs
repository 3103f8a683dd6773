use serde_json::json;

use rw_core::entities::NewChangeItem;
use rw_core::enums::{ImpactLevel, Priority};
use rw_db::repos::change_item::ChangeItemFilter;
use rw_db::updates::change_item::ChangeItemUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ItemCommands;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::{parse_date, parse_enum};
use crate::context::AppContext;
use crate::output::output;

/// Handle `regwatch item`.
pub async fn handle(action: &ItemCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        ItemCommands::Create {
            title,
            description,
            template,
            priority,
            impact,
            due,
            authority,
            sector,
            source_update,
        } => {
            let input = NewChangeItem {
                title: title.clone(),
                description: description.clone(),
                workflow_template_id: template.clone(),
                priority: priority
                    .as_deref()
                    .map(|p| parse_enum::<Priority>(p, "priority"))
                    .transpose()?
                    .unwrap_or_default(),
                impact_level: impact
                    .as_deref()
                    .map(|i| parse_enum::<ImpactLevel>(i, "impact"))
                    .transpose()?
                    .unwrap_or_default(),
                due_date: due.as_deref().map(|d| parse_date(d, "due")).transpose()?,
                authority: authority.clone(),
                sector: sector.clone(),
                source_update_id: source_update.clone(),
            };
            let item = ctx.service.create_change_item(input).await?;
            output(&item, flags.format)
        }
        ItemCommands::FromUpdate { update_id, template } => {
            let update = ctx.service.get_update(update_id).await?;
            let created = ctx
                .service
                .create_change_item_from_update(&update, template)
                .await?;
            output(&created, flags.format)
        }
        ItemCommands::Get { id } => {
            let item = ctx.service.get_change_item(id).await?;
            let counts = ctx.service.get_connection_counts(id).await?;
            output(&json!({ "item": item, "connections": counts }), flags.format)
        }
        ItemCommands::List {
            template,
            stage,
            priority,
            source_update,
            unassigned,
            limit,
        } => {
            let filter = ChangeItemFilter {
                template_id: template.clone(),
                stage: stage.clone(),
                priority: priority
                    .as_deref()
                    .map(|p| parse_enum::<Priority>(p, "priority"))
                    .transpose()?,
                source_update_id: source_update.clone(),
                unassigned: *unassigned,
                limit: Some(effective_limit(*limit, flags, &ctx.config.general)),
            };
            let items = ctx.service.list_change_items(&filter).await?;
            output(&items, flags.format)
        }
        ItemCommands::Update {
            id,
            title,
            description,
            priority,
            impact,
            due,
            expected_version,
        } => {
            let mut builder = ChangeItemUpdateBuilder::new();
            if let Some(title) = title {
                builder = builder.title(title.as_str());
            }
            if let Some(description) = description {
                builder = builder.description(Some(description.clone()));
            }
            if let Some(priority) = priority {
                builder = builder.priority(parse_enum(priority, "priority")?);
            }
            if let Some(impact) = impact {
                builder = builder.impact_level(parse_enum(impact, "impact")?);
            }
            if let Some(due) = due {
                builder = builder.due_date(Some(parse_date(due, "due")?));
            }
            if let Some(version) = expected_version {
                builder = builder.expected_version(*version);
            }
            let item = ctx.service.update_change_item(id, builder.build()).await?;
            output(&item, flags.format)
        }
        ItemCommands::Assign {
            id,
            template,
            unassign,
        } => {
            let item = match template {
                Some(template) if !unassign => ctx.service.assign_template(id, template).await?,
                _ => ctx.service.unassign_template(id).await?,
            };
            output(&item, flags.format)
        }
        ItemCommands::Advance {
            id,
            stage,
            notes,
            expected_version,
        } => {
            let transition = match expected_version {
                Some(version) => {
                    ctx.service
                        .advance_item_if_version(id, stage, notes.as_deref(), *version)
                        .await?
                }
                None => ctx.service.advance_item(id, stage, notes.as_deref()).await?,
            };
            output(&transition, flags.format)
        }
        ItemCommands::History { id } => {
            let history = ctx.service.stage_history(id).await?;
            output(&history, flags.format)
        }
        ItemCommands::Board { template } => {
            let board = ctx.service.board(template).await?;
            output(&board, flags.format)
        }
        ItemCommands::Delete { id } => {
            let deletion = ctx.service.delete_change_item(id).await?;
            output(&deletion, flags.format)
        }
    }
}
