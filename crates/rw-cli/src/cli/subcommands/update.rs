use clap::Subcommand;

/// Regulatory update commands.
#[derive(Clone, Debug, Subcommand)]
pub enum UpdateCommands {
    /// Ingest a JSONL file of updates and match them.
    Ingest { file: String },
    /// Get an update by ID.
    Get { id: String },
    /// List updates, newest first.
    List {
        #[arg(long)]
        limit: Option<u32>,
    },
}
