//! Plan data model.

use super::item::{Category, ItemKind};
use super::rules::RuleSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current plan file format version.
pub const PLAN_VERSION: &str = "1.0";

/// Plan file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan version.
    pub version: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Run identifier, shared with the journal of this run.
    pub run_id: String,
    /// Declared root of the tree.
    pub root: PathBuf,
    /// Rules the plan was derived from.
    pub rules: RuleSet,
    /// One operation per source item, in inventory order.
    pub operations: Vec<PlannedOperation>,
}

impl Plan {
    /// Operations that will be attempted.
    pub fn included(&self) -> impl Iterator<Item = &PlannedOperation> {
        self.operations.iter().filter(|op| op.included)
    }

    /// Included operations that actually change something on disk.
    pub fn changes(&self) -> impl Iterator<Item = &PlannedOperation> {
        self.included().filter(|op| !op.is_noop())
    }

    /// Whether any operation stages originals before overwriting.
    pub fn uses_staging(&self) -> bool {
        self.operations.iter().any(|op| op.staged)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// A single planned operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOperation {
    /// Source path.
    pub source: PathBuf,
    /// Final destination path (may equal `source`).
    pub destination: PathBuf,
    /// Operation type.
    pub kind: OperationKind,
    /// Whether the user left this item checked.
    pub included: bool,
    /// Source entry kind.
    pub item_kind: ItemKind,
    /// Category the item participated in.
    pub category: Category,
    /// Size of the source in bytes.
    pub size: u64,
    /// Whether the original is staged before the destination is written.
    #[serde(default)]
    pub staged: bool,
}

impl PlannedOperation {
    /// True when the operation leaves the filesystem unchanged.
    pub fn is_noop(&self) -> bool {
        self.kind != OperationKind::Delete && !self.staged && self.source == self.destination
    }
}

/// Operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Move,
    Delete,
    Transform,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Move => write!(f, "move"),
            OperationKind::Delete => write!(f, "delete"),
            OperationKind::Transform => write!(f, "transform"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(source: &str, destination: &str, included: bool) -> PlannedOperation {
        PlannedOperation {
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
            kind: OperationKind::Move,
            included,
            item_kind: ItemKind::File,
            category: Category::Image,
            size: 1,
            staged: false,
        }
    }

    #[test]
    fn test_changes_skip_noops_and_excluded() {
        let plan = Plan {
            operations: vec![
                op("/r/a.jpg", "/r/a.jpg", true),
                op("/r/b.jpg", "/r/c.jpg", true),
                op("/r/d.jpg", "/r/e.jpg", false),
            ],
            ..Plan::default()
        };
        assert_eq!(plan.included().count(), 2);
        let changes: Vec<_> = plan.changes().collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].source, PathBuf::from("/r/b.jpg"));
    }

    #[test]
    fn test_staged_same_path_is_not_noop() {
        let mut o = op("/r/a.jpg", "/r/a.jpg", true);
        o.kind = OperationKind::Transform;
        o.staged = true;
        assert!(!o.is_noop());
    }
}
