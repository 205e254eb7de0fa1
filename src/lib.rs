//! Folder Organizer Library
//!
//! A library for flattening, renaming, converting and deleting folder trees
//! in batches, with conflict-free planning and per-item rollback.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{Error, Result};
