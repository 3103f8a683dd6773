pub mod dispatch;
pub mod item;
pub mod link;
pub mod rescore;
pub mod schema;
pub mod shared;
pub mod template;
pub mod update;
pub mod watchlist;
