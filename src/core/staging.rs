//! Hidden staging directories holding originals during overwrite transforms.

use crate::utils::fs::{move_file, unique_path};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// A staged original: where it came from and where it is parked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub original: PathBuf,
    pub backup: PathBuf,
}

impl BackupRecord {
    /// Move the staged original back to its source path.
    ///
    /// Fails without touching anything if the source path is occupied.
    pub fn restore(&self) -> Result<()> {
        if fs::symlink_metadata(&self.original).is_ok() {
            return Err(crate::Error::DestinationExists(
                self.original.display().to_string(),
            ));
        }
        move_file(&self.backup, &self.original)
    }
}

/// Staging directories of one run, created lazily next to each source folder.
#[derive(Debug)]
pub struct StagingArea {
    dir_name: String,
    created: Vec<PathBuf>,
}

impl StagingArea {
    pub fn new(dir_name: impl Into<String>) -> Self {
        Self {
            dir_name: dir_name.into(),
            created: Vec::new(),
        }
    }

    /// Staging directory used for `source`.
    pub fn dir_for(&self, source: &Path) -> PathBuf {
        source
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.dir_name)
    }

    /// Create (once) the staging directory for `source`.
    ///
    /// Failure here is fatal for the run.
    pub fn ensure(&mut self, source: &Path) -> Result<PathBuf> {
        let dir = self.dir_for(source);
        if !self.created.contains(&dir) {
            fs::create_dir_all(&dir).map_err(|e| crate::Error::StagingUnavailable {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            tracing::debug!("Created staging directory: {:?}", dir);
            self.created.push(dir.clone());
        }
        Ok(dir)
    }

    /// Move `source` into its staging directory.
    pub fn stage(&mut self, source: &Path) -> Result<BackupRecord> {
        let dir = self.ensure(source)?;
        let name = source
            .file_name()
            .ok_or_else(|| crate::Error::other(format!("No file name: {:?}", source)))?;
        let backup = unique_path(&dir.join(name));
        move_file(source, &backup)?;
        Ok(BackupRecord {
            original: source.to_path_buf(),
            backup,
        })
    }

    /// Staging directories created so far, in creation order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.created
    }

    pub fn is_staging_dir(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy() == self.dir_name)
            .unwrap_or(false)
    }
}

/// Delete staging directories left behind by a run.
///
/// Returns the number of directories removed. Missing directories are
/// skipped; the first other error is returned after attempting all.
pub fn purge_staging(dirs: &[PathBuf]) -> Result<usize> {
    let mut removed = 0;
    let mut first_error = None;
    for dir in dirs {
        if !dir.exists() {
            continue;
        }
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                tracing::info!("Purged staging directory: {:?}", dir);
                removed += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to purge {:?}: {}", dir, e);
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(removed),
    }
}
