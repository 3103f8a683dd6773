use clap::Subcommand;

/// Workflow template commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TemplateCommands {
    /// Create a template from a built-in preset.
    Preset { name: String },
    /// Create a custom template.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// `Name:#color`, repeated in stage order
        #[arg(long, required = true)]
        stage: Vec<String>,
    },
    /// Get a template by ID.
    Get { id: String },
    /// List templates.
    List,
    /// Delete a template with no bound items.
    Delete { id: String },
}
