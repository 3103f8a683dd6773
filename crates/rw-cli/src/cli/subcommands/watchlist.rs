use clap::Subcommand;

/// Watch list commands.
#[derive(Clone, Debug, Subcommand)]
pub enum WatchlistCommands {
    /// Create a watch list.
    Create {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        keyword: Vec<String>,
        #[arg(long)]
        authority: Vec<String>,
        #[arg(long)]
        sector: Vec<String>,
        /// Minimum score in [0, 1] that creates a match, or a preset
        /// (broad, balanced, focused, strict)
        #[arg(long)]
        threshold: String,
        /// Create with alerts switched off
        #[arg(long)]
        disabled: bool,
    },
    /// Get a watch list by ID.
    Get { id: String },
    /// List watch lists.
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Update a watch list. Repeated criteria flags replace the whole list.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        keyword: Vec<String>,
        #[arg(long)]
        authority: Vec<String>,
        #[arg(long)]
        sector: Vec<String>,
        #[arg(long)]
        threshold: Option<String>,
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Switch alerts on.
    Enable { id: String },
    /// Switch alerts off.
    Disable { id: String },
    /// Delete a watch list with its matches and links.
    Delete { id: String },
    /// Matches recorded for a watch list.
    Matches {
        id: String,
        #[arg(long)]
        unreviewed: bool,
        #[arg(long)]
        min_score: Option<f64>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Mark one match reviewed.
    Review { match_id: String },
    /// Mark every match of a watch list reviewed.
    ReviewAll { id: String },
}
