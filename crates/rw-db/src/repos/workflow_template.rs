//! Workflow template repository: templates, presets, stage replacement.

use std::collections::HashMap;

use chrono::Utc;

use rw_core::entities::{NewWorkflowTemplate, Stage, WorkflowTemplate};
use rw_core::ids::PREFIX_TEMPLATE;
use rw_core::presets::WorkflowPreset;
use rw_core::validation::{optional_text, require_text, validate_new_template, validate_stages};

use crate::error::DatabaseError;
use crate::helpers::{count_rows, format_datetime, get_opt_string, parse_datetime};
use crate::service::RegService;
use crate::updates::workflow_template::TemplateUpdate;

const SELECT_COLS: &str = "id, name, description, stages, created_at, updated_at";

fn row_to_template(row: &libsql::Row) -> Result<WorkflowTemplate, DatabaseError> {
    let stages: Vec<Stage> = serde_json::from_str(&row.get::<String>(3)?)
        .map_err(|e| DatabaseError::Query(format!("Invalid stage list in column: {e}")))?;
    Ok(WorkflowTemplate {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        description: get_opt_string(row, 2)?,
        stages,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
        updated_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

pub(crate) async fn fetch_template(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<WorkflowTemplate>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {SELECT_COLS} FROM workflow_templates WHERE id = ?1"),
            [id],
        )
        .await?;
    rows.next().await?.map(|row| row_to_template(&row)).transpose()
}

pub(crate) async fn require_template(
    conn: &libsql::Connection,
    id: &str,
) -> Result<WorkflowTemplate, DatabaseError> {
    fetch_template(conn, id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("workflow_template", id))
}

/// How many items sit in each stage of a template.
async fn stage_usage(
    conn: &libsql::Connection,
    template_id: &str,
) -> Result<HashMap<String, u64>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT current_stage, COUNT(*) FROM regulatory_change_items
             WHERE workflow_template_id = ?1 GROUP BY current_stage",
            [template_id],
        )
        .await?;
    let mut usage = HashMap::new();
    while let Some(row) = rows.next().await? {
        let count = u64::try_from(row.get::<i64>(1)?)
            .map_err(|e| DatabaseError::InvalidState(format!("negative count: {e}")))?;
        usage.insert(row.get::<String>(0)?, count);
    }
    Ok(usage)
}

fn items_blocking(template_id: &str, dependents: u64) -> DatabaseError {
    DatabaseError::ReferentialIntegrity {
        entity_type: "workflow_template".into(),
        id: template_id.to_string(),
        dependent_type: "regulatory_change_item".into(),
        dependents,
    }
}

async fn update_template_in(
    conn: &libsql::Connection,
    id: &str,
    name: Option<String>,
    description: Option<Option<String>>,
    stages: Option<Vec<Stage>>,
) -> Result<WorkflowTemplate, DatabaseError> {
    let mut template = require_template(conn, id).await?;

    if name.is_none() && description.is_none() && stages.is_none() {
        return Ok(template);
    }

    if let Some(ref new_stages) = stages {
        let orphaned: u64 = stage_usage(conn, id)
            .await?
            .into_iter()
            .filter(|(stage, _)| !new_stages.iter().any(|s| &s.name == stage))
            .map(|(_, count)| count)
            .sum();
        if orphaned > 0 {
            return Err(items_blocking(id, orphaned));
        }
    }

    if let Some(name) = name {
        template.name = name;
    }
    if let Some(description) = description {
        template.description = description;
    }
    if let Some(stages) = stages {
        template.stages = stages;
    }
    template.updated_at = Utc::now();

    conn.execute(
        "UPDATE workflow_templates SET name = ?1, description = ?2, stages = ?3, updated_at = ?4
         WHERE id = ?5",
        libsql::params![
            template.name.as_str(),
            template.description.as_deref(),
            serde_json::to_string(&template.stages)?,
            format_datetime(&template.updated_at),
            id
        ],
    )
    .await?;

    Ok(template)
}

impl RegService {
    pub async fn create_workflow_template(
        &self,
        input: NewWorkflowTemplate,
    ) -> Result<WorkflowTemplate, DatabaseError> {
        let input = validate_new_template(&input)?;
        let stages_json = serde_json::to_string(&input.stages)?;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_TEMPLATE).await?;

        let tx = self.db().begin().await?;
        let result = tx
            .execute(
                "INSERT INTO workflow_templates (id, name, description, stages, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    input.name.as_str(),
                    input.description.as_deref(),
                    stages_json,
                    format_datetime(&now),
                    format_datetime(&now)
                ],
            )
            .await
            .map_err(DatabaseError::from);
        tx.finish(result).await?;

        tracing::debug!(template = %id, stages = input.stages.len(), "workflow template created");

        Ok(WorkflowTemplate {
            id,
            name: input.name,
            description: input.description,
            stages: input.stages,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a template from one of the built-in presets, by display name or
    /// slug.
    pub async fn create_from_preset(&self, preset_name: &str) -> Result<WorkflowTemplate, DatabaseError> {
        let preset = WorkflowPreset::from_name(preset_name)?;
        self.create_workflow_template(preset.to_new_template()).await
    }

    pub async fn get_workflow_template(&self, id: &str) -> Result<WorkflowTemplate, DatabaseError> {
        require_template(&*self.db().read().await, id).await
    }

    pub async fn list_workflow_templates(&self) -> Result<Vec<WorkflowTemplate>, DatabaseError> {
        let conn = self.db().read().await;
        let mut rows = conn
            .query(
                &format!("SELECT {SELECT_COLS} FROM workflow_templates ORDER BY created_at, id"),
                (),
            )
            .await?;
        let mut templates = Vec::new();
        while let Some(row) = rows.next().await? {
            templates.push(row_to_template(&row)?);
        }
        Ok(templates)
    }

    /// Rename a template or replace its stage list.
    ///
    /// Replacing stages fails with `ReferentialIntegrity` when any bound item
    /// sits in a stage the new list drops.
    pub async fn update_workflow_template(
        &self,
        id: &str,
        update: TemplateUpdate,
    ) -> Result<WorkflowTemplate, DatabaseError> {
        let name = update
            .name
            .as_deref()
            .map(|n| require_text("template name", n))
            .transpose()?;
        let description = update.description.as_ref().map(|d| optional_text(d.as_deref()));
        let stages = update.stages.as_deref().map(validate_stages).transpose()?;

        let tx = self.db().begin().await?;
        let result = update_template_in(&tx, id, name, description, stages).await;
        tx.finish(result).await
    }

    /// Delete a template. Rejected while any change item is bound to it.
    pub async fn delete_workflow_template(&self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            require_template(&tx, id).await?;
            let bound = count_rows(
                &tx,
                "SELECT COUNT(*) FROM regulatory_change_items WHERE workflow_template_id = ?1",
                [id],
            )
            .await?;
            if bound > 0 {
                return Err(items_blocking(id, bound));
            }
            tx.execute("DELETE FROM workflow_templates WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{item_on, quick_template, test_service};
    use crate::updates::workflow_template::TemplateUpdateBuilder;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_from_preset_keeps_table_order() {
        let svc = test_service().await;
        let template = svc.create_from_preset("Quick Assessment").await.unwrap();
        assert!(rw_core::ids::has_prefix(&template.id, PREFIX_TEMPLATE));
        assert_eq!(template.stage_names(), vec!["New", "Assessing", "Actioned"]);

        let fetched = svc.get_workflow_template(&template.id).await.unwrap();
        assert_eq!(fetched.stages, template.stages);
        assert_eq!(fetched.first_stage().unwrap().name, "New");
    }

    #[tokio::test]
    async fn unknown_preset_is_validation_error() {
        let svc = test_service().await;
        let err = svc.create_from_preset("Kanban Deluxe").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(svc.list_workflow_templates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_stage_names() {
        let svc = test_service().await;
        let err = svc
            .create_workflow_template(NewWorkflowTemplate {
                name: "Custom".into(),
                description: None,
                stages: vec![Stage::new("Draft", 1, "#000"), Stage::new("draft", 2, "#fff")],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn rename_and_replace_unused_stages() {
        let svc = test_service().await;
        let template = quick_template(&svc).await;
        let updated = svc
            .update_workflow_template(
                &template.id,
                TemplateUpdateBuilder::new()
                    .name("Triage")
                    .stages(vec![Stage::new("Inbox", 1, "#6b7280"), Stage::new("Done", 2, "#10b981")])
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Triage");
        assert_eq!(updated.stage_names(), vec!["Inbox", "Done"]);
        assert_eq!(
            svc.get_workflow_template(&template.id).await.unwrap().stage_names(),
            vec!["Inbox", "Done"]
        );
    }

    #[tokio::test]
    async fn replacing_an_occupied_stage_is_blocked() {
        let svc = test_service().await;
        let template = quick_template(&svc).await;
        item_on(&svc, &template).await;

        let err = svc
            .update_workflow_template(
                &template.id,
                TemplateUpdateBuilder::new()
                    .stages(vec![Stage::new("Assessing", 1, "#000")])
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::ReferentialIntegrity { dependents: 1, .. }
        ));

        // Keeping the occupied stage is fine.
        svc.update_workflow_template(
            &template.id,
            TemplateUpdateBuilder::new()
                .stages(vec![Stage::new("New", 1, "#000"), Stage::new("Closed", 2, "#fff")])
                .build(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn delete_with_bound_items_reports_count() {
        let svc = test_service().await;
        let template = quick_template(&svc).await;
        item_on(&svc, &template).await;
        item_on(&svc, &template).await;

        let err = svc.delete_workflow_template(&template.id).await.unwrap_err();
        match err {
            DatabaseError::ReferentialIntegrity {
                dependents,
                dependent_type,
                ..
            } => {
                assert_eq!(dependents, 2);
                assert_eq!(dependent_type, "regulatory_change_item");
            }
            other => panic!("expected ReferentialIntegrity, got {other:?}"),
        }
        assert!(svc.get_workflow_template(&template.id).await.is_ok());
    }

    #[tokio::test]
    async fn delete_unused_template() {
        let svc = test_service().await;
        let template = quick_template(&svc).await;
        svc.delete_workflow_template(&template.id).await.unwrap();
        assert!(matches!(
            svc.get_workflow_template(&template.id).await.unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }
}
