//! Destination folder resolution.

use crate::models::rules::{FlattenScope, OutputTarget};
use std::path::{Component, Path, PathBuf};

/// Folder segments of `folder` below `root`, or `None` if it is not inside it.
fn relative_segments<'a>(root: &Path, folder: &'a Path) -> Option<Vec<&'a std::ffi::OsStr>> {
    let rel = folder.strip_prefix(root).ok()?;
    Some(
        rel.components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name),
                _ => None,
            })
            .collect(),
    )
}

/// Destination folder for an item living in `folder`.
///
/// Folders outside `root`, and items planned without a flatten scope, keep
/// their original folder.
pub fn resolve_folder(root: &Path, folder: &Path, scope: Option<FlattenScope>) -> PathBuf {
    let scope = match scope {
        Some(scope) => scope,
        None => return folder.to_path_buf(),
    };
    let segments = match relative_segments(root, folder) {
        Some(segments) => segments,
        None => {
            tracing::debug!("Folder {:?} is outside root {:?}, keeping it", folder, root);
            return folder.to_path_buf();
        }
    };

    match scope {
        FlattenScope::RootFirst => root.to_path_buf(),
        FlattenScope::TopLevelFirst => match segments.first() {
            Some(top) => root.join(top),
            None => root.to_path_buf(),
        },
        FlattenScope::SubLevelFirst => {
            let mut dest = root.to_path_buf();
            for segment in segments.iter().skip(1) {
                dest.push(segment);
            }
            dest
        }
    }
}

/// Redirect a destination folder according to the transform output target.
pub fn apply_output(folder: &Path, output: &OutputTarget) -> PathBuf {
    match output {
        OutputTarget::Overwrite => folder.to_path_buf(),
        OutputTarget::Subfolder(name) if !name.trim().is_empty() => folder.join(name.trim()),
        OutputTarget::Subfolder(_) => folder.to_path_buf(),
        OutputTarget::Directory(dir) if !dir.as_os_str().is_empty() => dir.clone(),
        OutputTarget::Directory(_) => folder.to_path_buf(),
    }
}
