//! CLI command implementations.

pub mod compose;
pub mod delete;
pub mod import;
pub mod list;
pub mod send;
pub mod show;
