//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some` fields
//! change the stored row. `Option<Option<T>>` distinguishes "leave alone" (`None`)
//! from "clear" (`Some(None)`). An `expected_version` turns the write into a
//! compare-and-set against the row's `version` column.

pub mod change_item;
pub mod watch_list;
pub mod workflow_template;
