//! Repository modules implementing every Regwatch store operation.
//!
//! Each module adds methods to `RegService` via `impl RegService` blocks.
//! Write paths take a `RegDb::begin` transaction; row-level helpers take a
//! plain `&libsql::Connection` so composite operations can share one
//! transaction.

pub mod change_item;
pub mod cross_link;
pub mod ingest;
pub mod match_record;
pub mod rescore;
pub mod update;
pub mod watch_list;
pub mod workflow_template;
