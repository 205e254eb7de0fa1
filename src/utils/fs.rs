//! File system utilities.

use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Check if a path exists and is a directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(crate::Error::PathNotFound(path.display().to_string()));
    }
    if !path.is_dir() {
        return Err(crate::Error::NotADirectory(path.display().to_string()));
    }
    Ok(())
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Move a file from one location to another.
///
/// Uses a rename when possible. Across filesystems the file is copied,
/// verified by checksum and only then removed from its old location.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::debug!("Cross-filesystem move detected, using copy+delete");
        }
        Err(e) => return Err(e.into()),
    }

    let checksum = super::hash::sha256_file(from)?;
    fs::copy(from, to)?;
    if super::hash::sha256_file(to)? != checksum {
        let _ = fs::remove_file(to);
        return Err(crate::Error::ExecuteError(format!(
            "Checksum mismatch after copying: {:?}",
            to
        )));
    }
    fs::remove_file(from)?;
    Ok(())
}

/// Remove a file, clearing the read-only flag and retrying once if needed.
pub fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            let mut perms = fs::metadata(path)?.permissions();
            if !perms.readonly() {
                return Err(crate::Error::PermissionDenied(path.display().to_string()));
            }
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
            fs::set_permissions(path, perms)?;
            fs::remove_file(path)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Size of a file in bytes, or 0 if it cannot be read.
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Split a file name into base name and extension (without the dot).
///
/// Leading-dot names such as `.hidden` have no extension.
pub fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Join a base name and an optional extension.
pub fn join_name(base: &str, ext: Option<&str>) -> String {
    match ext {
        Some(ext) if !ext.is_empty() => format!("{}.{}", base, ext),
        _ => base.to_string(),
    }
}

/// Case-insensitive comparison key for a path.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

/// Return `path` if free, otherwise the first `name(n).ext` sibling that is.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let (base, ext) = split_name(&name);
    let mut counter = 1;
    loop {
        let candidate = parent.join(join_name(&format!("{}({})", base, counter), ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
