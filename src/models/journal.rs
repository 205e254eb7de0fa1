//! Run journal data model.

use super::plan::OperationKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Journal file structure: what a run changed, in execution order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    /// Journal version.
    pub version: String,
    /// Run identifier of the executed plan.
    pub run_id: String,
    /// Execution timestamp.
    pub executed_at: String,
    /// Declared root of the run.
    pub root: PathBuf,
    /// Successful operations.
    pub entries: Vec<JournalEntry>,
}

/// A single successful operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Sequence number.
    pub seq: u32,
    /// Operation type that was performed.
    pub kind: OperationKind,
    /// Original location.
    pub from: PathBuf,
    /// New location.
    pub to: PathBuf,
    /// Staged original, for overwrite transforms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}
