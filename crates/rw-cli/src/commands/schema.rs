use schemars::{Schema, schema_for};

use rw_core::entities::{
    BoardColumn, ConnectionCounts, CrossLink, LinkedItems, MatchRecord, NewChangeItem,
    NewWatchList, NewWorkflowTemplate, RegulatoryChangeItem, RegulatoryUpdate, StageHistoryEntry,
    WatchList, WorkflowTemplate,
};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

/// Names accepted by `regwatch schema`.
pub const SCHEMA_NAMES: &[&str] = &[
    "regulatory_update",
    "watch_list",
    "new_watch_list",
    "match_record",
    "workflow_template",
    "new_workflow_template",
    "change_item",
    "new_change_item",
    "stage_history_entry",
    "board_column",
    "cross_link",
    "linked_items",
    "connection_counts",
];

fn schema_by_name(name: &str) -> Option<Schema> {
    let schema = match name {
        "regulatory_update" => schema_for!(RegulatoryUpdate),
        "watch_list" => schema_for!(WatchList),
        "new_watch_list" => schema_for!(NewWatchList),
        "match_record" => schema_for!(MatchRecord),
        "workflow_template" => schema_for!(WorkflowTemplate),
        "new_workflow_template" => schema_for!(NewWorkflowTemplate),
        "change_item" => schema_for!(RegulatoryChangeItem),
        "new_change_item" => schema_for!(NewChangeItem),
        "stage_history_entry" => schema_for!(StageHistoryEntry),
        "board_column" => schema_for!(BoardColumn),
        "cross_link" => schema_for!(CrossLink),
        "linked_items" => schema_for!(LinkedItems),
        "connection_counts" => schema_for!(ConnectionCounts),
        _ => return None,
    };
    Some(schema)
}

/// Handle `regwatch schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let name = args.type_name.trim().to_lowercase().replace('-', "_");
    let schema = schema_by_name(&name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown schema '{}' (known: {})",
            args.type_name,
            SCHEMA_NAMES.join(", ")
        )
    })?;
    output(&schema, flags.format)
}
