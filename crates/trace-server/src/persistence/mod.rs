//! Persistence layer for trace datasets.
//!
//! SQLite-backed key-value storage: one row per dataset name holding
//! the serialized coords/poi/markers triple, atomic per row.

pub mod datasets;
pub mod db;

pub use db::{init_database, Database};
