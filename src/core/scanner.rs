//! Directory scanner module.
//!
//! Walks a root directory and captures every file and directory below it as
//! an [`Inventory`], classified by extension and in natural order.

use crate::core::naming::natural_cmp;
use crate::models::item::{Inventory, SourceItem};
use crate::models::rules::CategoryFilters;
use crate::utils::fs::ensure_directory;
use crate::Result;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Scan a directory tree into an inventory.
///
/// The root itself is not part of the inventory. Symlinks are not followed.
/// Entries that cannot be read are logged and skipped.
pub fn scan_inventory(root: &Path, filters: &CategoryFilters) -> Result<Inventory> {
    scan_inventory_excluding(root, filters, &[])
}

/// Scan like [`scan_inventory`], leaving out directories with the given names
/// (and everything below them), e.g. staging directories of earlier runs.
pub fn scan_inventory_excluding(
    root: &Path,
    filters: &CategoryFilters,
    skip_dirs: &[&str],
) -> Result<Inventory> {
    ensure_directory(root)?;

    let skipped = |entry: &DirEntry| {
        entry.file_type().is_dir()
            && skip_dirs
                .iter()
                .any(|name| entry.file_name().to_string_lossy() == *name)
    };

    let mut items = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !skipped(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            items.push(SourceItem::directory(entry.path()));
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!("Cannot read metadata of {:?}: {}", entry.path(), e);
                continue;
            }
        };
        let category = filters.classify(entry.path());
        items.push(SourceItem::file(entry.path(), size, category));
    }

    items.sort_by(|a, b| natural_cmp(&a.path.to_string_lossy(), &b.path.to_string_lossy()));

    let inventory = Inventory::new(root, items);
    tracing::info!(
        "Scanned {:?}: {} files, {} directories",
        root,
        inventory.file_count(),
        inventory.dir_count()
    );
    Ok(inventory)
}
