mod item;
mod template;
mod update;
mod watchlist;

pub use item::ItemCommands;
pub use template::TemplateCommands;
pub use update::UpdateCommands;
pub use watchlist::WatchlistCommands;
