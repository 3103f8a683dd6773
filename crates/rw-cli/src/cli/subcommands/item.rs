use clap::Subcommand;

/// Regulatory change item commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ItemCommands {
    /// Create a change item.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        impact: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        authority: Option<String>,
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        source_update: Option<String>,
    },
    /// Open a change item for a stored update and link the two.
    FromUpdate {
        update_id: String,
        #[arg(long)]
        template: String,
    },
    /// Get a change item by ID.
    Get { id: String },
    /// List change items.
    List {
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        source_update: Option<String>,
        #[arg(long)]
        unassigned: bool,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Edit descriptive fields.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        impact: Option<String>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Bind to a template (first stage), or unbind with --unassign.
    Assign {
        id: String,
        #[arg(required_unless_present = "unassign")]
        template: Option<String>,
        #[arg(long, conflicts_with = "template")]
        unassign: bool,
    },
    /// Move to a stage of the bound template.
    Advance {
        id: String,
        stage: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Stage transitions, oldest first.
    History { id: String },
    /// Kanban board of a template.
    Board { template: String },
    /// Delete a change item with its history and links.
    Delete { id: String },
}
