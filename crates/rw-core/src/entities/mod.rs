//! Entity structs for all Regwatch domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `rw-db/migrations`).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip
//! and schema export.

mod change_item;
mod link;
mod match_record;
mod update;
mod watch_list;
mod workflow;

pub use change_item::{BoardColumn, NewChangeItem, RegulatoryChangeItem, StageHistoryEntry};
pub use link::{ConnectionCounts, CrossLink, EntityRef, LinkGroup, LinkedEntity, LinkedItems};
pub use match_record::{MatchRecord, MatchSummary};
pub use update::RegulatoryUpdate;
pub use watch_list::{NewWatchList, WatchCriteria, WatchList};
pub use workflow::{NewWorkflowTemplate, Stage, WorkflowTemplate};
