//! # rw-core
//!
//! Core types, scoring, and error types for Regwatch.
//!
//! This crate provides the foundational types shared across all Regwatch crates:
//! - Entity structs for all domain objects (watch lists, match records, workflow
//!   templates, change items, cross-links)
//! - Enums for priorities, impact levels and link endpoint kinds
//! - The pure criteria matcher that scores an update against a watch list
//! - The fixed workflow preset table
//! - Input validation rules applied before any mutation
//! - ID prefix constants
//! - Cross-cutting error types
//!
//! Nothing in here performs I/O.

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod matcher;
pub mod presets;
pub mod stage;
pub mod validation;
