//! CLI command implementations.

pub mod delete;
pub mod execute;
pub mod plan;
pub mod purge;
pub mod undo;
