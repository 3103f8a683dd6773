use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Watchlist { action } => commands::watchlist::handle(&action, ctx, flags).await,
        Commands::Update { action } => commands::update::handle(&action, ctx, flags).await,
        Commands::Template { action } => commands::template::handle(&action, ctx, flags).await,
        Commands::Item { action } => commands::item::handle(&action, ctx, flags).await,
        Commands::Link(args) => commands::link::handle_link(&args, ctx, flags).await,
        Commands::Unlink(args) => commands::link::handle_unlink(&args, ctx, flags).await,
        Commands::Links(args) => commands::link::handle_links(&args, ctx, flags).await,
        Commands::Counts(args) => commands::link::handle_counts(&args, ctx, flags).await,
        Commands::Rescore => commands::rescore::handle(ctx, flags).await,
        Commands::Schema(args) => commands::schema::handle(&args, flags),
    }
}
