use serde_json::json;

use rw_core::entities::NewWorkflowTemplate;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TemplateCommands;
use crate::commands::shared::parse::parse_stages;
use crate::context::AppContext;
use crate::output::output;

/// Handle `regwatch template`.
pub async fn handle(
    action: &TemplateCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        TemplateCommands::Preset { name } => {
            let template = ctx.service.create_from_preset(name).await?;
            output(&template, flags.format)
        }
        TemplateCommands::Create {
            name,
            description,
            stage,
        } => {
            let template = ctx
                .service
                .create_workflow_template(NewWorkflowTemplate {
                    name: name.clone(),
                    description: description.clone(),
                    stages: parse_stages(stage)?,
                })
                .await?;
            output(&template, flags.format)
        }
        TemplateCommands::Get { id } => {
            let template = ctx.service.get_workflow_template(id).await?;
            output(&template, flags.format)
        }
        TemplateCommands::List => {
            let templates = ctx.service.list_workflow_templates().await?;
            output(&templates, flags.format)
        }
        TemplateCommands::Delete { id } => {
            ctx.service.delete_workflow_template(id).await?;
            output(&json!({ "deleted": id }), flags.format)
        }
    }
}
