//! Deletion sequencing.
//!
//! Orders removals so a directory is never removed before anything beneath
//! it: files first, then directories from the longest path to the shortest,
//! then the declared root.

use crate::models::item::{Category, ItemKind, SourceItem};
use crate::models::plan::{OperationKind, PlannedOperation};
use crate::models::rules::RuleSet;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Sort directories so that deeper paths come first.
///
/// A descendant's path is always longer than its ancestor's, so ordering by
/// descending length puts every child before its parent. Equal lengths are
/// ordered by path for a stable result.
pub fn order_directories(dirs: &mut [PathBuf]) {
    dirs.sort_by(|a, b| {
        b.as_os_str()
            .len()
            .cmp(&a.as_os_str().len())
            .then_with(|| a.cmp(b))
    });
}

/// Removal order for an inventory: files, directories deepest first, root last.
pub fn sequence(root: &Path, items: &[SourceItem]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for item in items {
        if item.path == root {
            continue;
        }
        match item.kind {
            ItemKind::File => files.push(item.path.clone()),
            ItemKind::Directory => dirs.push(item.path.clone()),
        }
    }
    order_directories(&mut dirs);
    files.extend(dirs);
    files.push(root.to_path_buf());
    files
}

/// Delete operations for an inventory, in removal order.
pub fn plan_deletion(root: &Path, items: &[SourceItem], rules: &RuleSet) -> Vec<PlannedOperation> {
    let by_path: HashMap<&Path, &SourceItem> =
        items.iter().map(|i| (i.path.as_path(), i)).collect();

    sequence(root, items)
        .into_iter()
        .map(|path| {
            let item = by_path.get(path.as_path());
            PlannedOperation {
                size: item.map(|i| i.size).unwrap_or(0),
                item_kind: item.map(|i| i.kind).unwrap_or(ItemKind::Directory),
                included: !keeps(rules, &path),
                destination: path.clone(),
                source: path,
                kind: OperationKind::Delete,
                category: Category::Other,
                staged: false,
            }
        })
        .collect()
}

/// Whether `path` must survive: it is unchecked, lies inside an unchecked
/// folder, or is an ancestor of an unchecked path.
fn keeps(rules: &RuleSet, path: &Path) -> bool {
    rules
        .excluded
        .iter()
        .any(|ex| path.starts_with(ex) || ex.starts_with(path))
}

/// Refuse to delete a filesystem root or the home directory.
pub fn check_root(root: &Path) -> Result<()> {
    let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let is_fs_root = resolved.parent().is_none();
    let is_home = dirs::home_dir()
        .map(|home| {
            let home = home.canonicalize().unwrap_or(home);
            home == resolved
        })
        .unwrap_or(false);

    if root.as_os_str().is_empty() || is_fs_root || is_home {
        return Err(crate::Error::DangerousRoot(root.display().to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_order() {
        let items = vec![
            SourceItem::directory("/r/a"),
            SourceItem::file("/r/a/x.txt", 1, Category::Other),
            SourceItem::directory("/r/a/bb"),
            SourceItem::directory("/r/a/bb/c"),
            SourceItem::file("/r/y.txt", 1, Category::Other),
        ];
        let order = sequence(Path::new("/r"), &items);
        assert_eq!(
            order,
            vec![
                PathBuf::from("/r/a/x.txt"),
                PathBuf::from("/r/y.txt"),
                PathBuf::from("/r/a/bb/c"),
                PathBuf::from("/r/a/bb"),
                PathBuf::from("/r/a"),
                PathBuf::from("/r"),
            ]
        );
    }

    #[test]
    fn test_plan_deletion_marks_excluded() {
        let items = vec![
            SourceItem::directory("/r/a"),
            SourceItem::file("/r/a/x.txt", 7, Category::Other),
        ];
        let rules = RuleSet::delete().exclude("/r/a/x.txt");
        let ops = plan_deletion(Path::new("/r"), &items, &rules);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].source, PathBuf::from("/r/a/x.txt"));
        assert_eq!(ops[0].item_kind, ItemKind::File);
        assert_eq!(ops[0].size, 7);
        assert!(!ops[0].included);
        assert_eq!(ops[2].source, PathBuf::from("/r"));
        assert!(ops.iter().all(|o| o.kind == OperationKind::Delete));
        // Folders holding a kept file are kept as well.
        assert!(ops.iter().all(|o| !o.included));
    }

    #[test]
    fn test_plan_deletion_keeps_excluded_folder_contents() {
        let items = vec![
            SourceItem::directory("/r/keep"),
            SourceItem::file("/r/keep/x.txt", 1, Category::Other),
            SourceItem::file("/r/y.txt", 1, Category::Other),
        ];
        let rules = RuleSet::delete().exclude("/r/keep");
        let ops = plan_deletion(Path::new("/r"), &items, &rules);
        let included: Vec<_> = ops.iter().filter(|o| o.included).map(|o| o.source.clone()).collect();
        assert_eq!(included, vec![PathBuf::from("/r/y.txt")]);
    }

    #[test]
    fn test_check_root() {
        assert!(check_root(Path::new("/")).is_err());
        if let Some(home) = dirs::home_dir() {
            assert!(check_root(&home).is_err());
        }
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(check_root(temp_dir.path()).is_ok());
    }
}
