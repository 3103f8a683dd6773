use clap::{Args, Subcommand};

use crate::cli::subcommands::{ItemCommands, TemplateCommands, UpdateCommands, WatchlistCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Watch lists and their matches.
    Watchlist {
        #[command(subcommand)]
        action: WatchlistCommands,
    },
    /// Regulatory updates.
    Update {
        #[command(subcommand)]
        action: UpdateCommands,
    },
    /// Workflow templates.
    Template {
        #[command(subcommand)]
        action: TemplateCommands,
    },
    /// Regulatory change items.
    Item {
        #[command(subcommand)]
        action: ItemCommands,
    },
    /// Link two entities.
    Link(LinkArgs),
    /// Remove a link.
    Unlink(UnlinkArgs),
    /// Entities linked to one entity, grouped by kind.
    Links(LinksArgs),
    /// Connection counts for an entity id.
    Counts(CountsArgs),
    /// Add missing matches for every enabled watch list (Ctrl-C to stop).
    Rescore,
    /// Dump JSON schema for an entity type.
    Schema(SchemaArgs),
}

/// Arguments for `regwatch link`.
#[derive(Clone, Debug, Args)]
pub struct LinkArgs {
    /// update, workflow_item, watchlist, dossier or policy
    pub source_type: String,
    pub source_id: String,
    pub target_type: String,
    pub target_id: String,
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for `regwatch unlink`.
#[derive(Clone, Debug, Args)]
pub struct UnlinkArgs {
    pub link_id: String,
}

/// Arguments for `regwatch links`.
#[derive(Clone, Debug, Args)]
pub struct LinksArgs {
    pub kind: String,
    pub id: String,
}

/// Arguments for `regwatch counts`.
#[derive(Clone, Debug, Args)]
pub struct CountsArgs {
    pub id: String,
}

/// Arguments for `regwatch schema`.
#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Entity name, e.g. `watch_list` or `change_item`
    pub type_name: String,
}
