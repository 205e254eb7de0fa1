//! Source inventory data model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Directory,
}

/// Media category of a file, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Image => write!(f, "image"),
            Category::Video => write!(f, "video"),
            Category::Other => write!(f, "other"),
        }
    }
}

/// A file or directory captured from the source tree.
///
/// Identity is the path at capture time; the value never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    /// Full path to the entry.
    pub path: PathBuf,
    /// File or directory.
    pub kind: ItemKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Category at capture time.
    pub category: Category,
}

impl SourceItem {
    /// Create a file item.
    pub fn file(path: impl Into<PathBuf>, size: u64, category: Category) -> Self {
        Self {
            path: path.into(),
            kind: ItemKind::File,
            size,
            category,
        }
    }

    /// Create a directory item.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: ItemKind::Directory,
            size: 0,
            category: Category::Other,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ItemKind::Directory
    }

    /// File name without path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Parent folder of the entry.
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Ordered list of source items under a declared root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Declared root of the tree.
    pub root: PathBuf,
    /// Items in capture order.
    pub items: Vec<SourceItem>,
}

impl Inventory {
    pub fn new(root: impl Into<PathBuf>, items: Vec<SourceItem>) -> Self {
        Self {
            root: root.into(),
            items,
        }
    }

    /// Total size of all files in bytes.
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|i| i.size).sum()
    }

    pub fn file_count(&self) -> usize {
        self.items.iter().filter(|i| !i.is_dir()).count()
    }

    pub fn dir_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_dir()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_counts() {
        let inv = Inventory::new(
            "/root",
            vec![
                SourceItem::directory("/root/a"),
                SourceItem::file("/root/a/x.jpg", 10, Category::Image),
                SourceItem::file("/root/y.mp4", 32, Category::Video),
            ],
        );
        assert_eq!(inv.total_size(), 42);
        assert_eq!(inv.file_count(), 2);
        assert_eq!(inv.dir_count(), 1);
    }

    #[test]
    fn test_source_item_names() {
        let item = SourceItem::file("/root/a/x.jpg", 1, Category::Image);
        assert_eq!(item.file_name(), "x.jpg");
        assert_eq!(item.folder(), Path::new("/root/a"));
    }
}
