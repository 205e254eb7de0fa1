//! Run journal and undo.
//!
//! The journal lists the successful operations of a run in execution order.
//! Undo walks it backwards:
//! - Move files back to their original locations
//! - Replace transform outputs with their staged originals
//! - Remove transform outputs written next to untouched originals
//!
//! Deletions cannot be undone and are reported as skipped.

use crate::core::staging::{BackupRecord, StagingArea};
use crate::models::journal::{Journal, JournalEntry};
use crate::models::outcome::TerminalEvent;
use crate::models::plan::{OperationKind, Plan};
use crate::utils::fs::{ensure_parent, move_file, remove_file};
use crate::Result;
use chrono::Utc;
use colored::Colorize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current journal file format version.
pub const JOURNAL_VERSION: &str = "1.0";

/// Build the journal of a finished run.
pub fn build_journal(plan: &Plan, event: &TerminalEvent) -> Journal {
    let entries = event
        .outcomes
        .iter()
        .filter(|o| o.status.is_success())
        .enumerate()
        .map(|(i, o)| JournalEntry {
            seq: i as u32 + 1,
            kind: o.kind,
            from: o.source.clone(),
            to: o.destination.clone(),
            backup: o.backup.clone(),
        })
        .collect();

    Journal {
        version: JOURNAL_VERSION.to_string(),
        run_id: plan.run_id.clone(),
        executed_at: Utc::now().to_rfc3339(),
        root: plan.root.clone(),
        entries,
    }
}

/// Undo executor.
pub struct RollbackExecutor {
    dry_run: bool,
    staging_dir_name: String,
}

impl RollbackExecutor {
    /// Create a new undo executor.
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            staging_dir_name: ".temp".to_string(),
        }
    }

    /// Use a different staging directory name for files parked while undoing.
    pub fn with_staging_dir_name(mut self, name: impl Into<String>) -> Self {
        self.staging_dir_name = name.into();
        self
    }

    /// Reverse every entry of a journal, newest first.
    pub fn execute(&self, journal: &Journal) -> RollbackResult {
        let mut result = RollbackResult {
            conflicts: self.check_conflicts(journal),
            ..RollbackResult::default()
        };

        let mut staging = StagingArea::new(self.staging_dir_name.clone());
        // Occupants moved aside, keyed by the location they were taken from.
        let mut parked: HashMap<PathBuf, BackupRecord> = HashMap::new();
        // Locations written by entries not reversed yet.
        let mut unreversed: HashSet<&Path> = journal
            .entries
            .iter()
            .filter(|e| e.kind != OperationKind::Delete)
            .map(|e| e.to.as_path())
            .collect();

        for entry in journal.entries.iter().rev() {
            unreversed.remove(entry.to.as_path());
            if entry.kind == OperationKind::Delete {
                result.skip_count += 1;
                result
                    .skipped
                    .push(format!("Deletion cannot be undone: {}", entry.from.display()));
                continue;
            }

            if self.dry_run {
                result.planned.push(describe(entry));
                result.success_count += 1;
                continue;
            }

            // The original location holds a file a later undo step moves back:
            // park it, as happens for rename cycles during execution.
            if entry.kind == OperationKind::Move
                && unreversed.contains(entry.from.as_path())
                && !parked.contains_key(&entry.from)
                && entry.from.exists()
            {
                match staging.stage(&entry.from) {
                    Ok(record) => {
                        tracing::debug!("Parked {:?} to undo a rename cycle", entry.from);
                        parked.insert(entry.from.clone(), record);
                    }
                    Err(e) => tracing::warn!("Cannot park {:?}: {}", entry.from, e),
                }
            }

            let record = parked.remove(&entry.to);
            let current = record
                .as_ref()
                .map(|r| r.backup.as_path())
                .unwrap_or(entry.to.as_path());
            match self.undo_entry(entry, current) {
                Ok(true) => result.success_count += 1,
                Ok(false) => result.skip_count += 1,
                Err(e) => {
                    if let Some(record) = record {
                        parked.insert(entry.to.clone(), record);
                    }
                    let error_msg = format!("{}: {}", entry.to.display(), e);
                    tracing::error!("Undo failed: {}", error_msg);
                    result.errors.push(error_msg);
                    result.error_count += 1;
                }
            }
        }

        self.settle_parked(parked, &staging, &mut result);
        result
    }

    /// Return files still parked to where they were taken from, then drop
    /// staging directories left empty.
    fn settle_parked(
        &self,
        parked: HashMap<PathBuf, BackupRecord>,
        staging: &StagingArea,
        result: &mut RollbackResult,
    ) {
        for record in parked.into_values() {
            if let Err(e) = record.restore() {
                let error_msg = format!(
                    "{}: {}; file kept at {}",
                    record.original.display(),
                    e,
                    record.backup.display()
                );
                tracing::error!("Undo failed: {}", error_msg);
                result.errors.push(error_msg);
                result.error_count += 1;
            }
        }
        for dir in staging.dirs() {
            let empty = fs::read_dir(dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if empty && fs::remove_dir(dir).is_ok() {
                tracing::debug!("Removed empty staging directory: {:?}", dir);
            }
        }
    }

    /// Find entries that cannot be reversed cleanly.
    fn check_conflicts(&self, journal: &Journal) -> Vec<String> {
        let mut conflicts = Vec::new();
        // Locations written by the run are freed again while undoing.
        let written: HashSet<&Path> = journal.entries.iter().map(|e| e.to.as_path()).collect();
        let occupied = |path: &Path| path.exists() && !written.contains(path);

        for entry in &journal.entries {
            match (entry.kind, &entry.backup) {
                (OperationKind::Delete, _) => {}
                (OperationKind::Transform, Some(backup)) => {
                    if !backup.exists() {
                        conflicts.push(format!("Staged original missing: {}", backup.display()));
                    }
                    if entry.from != entry.to && occupied(&entry.from) {
                        conflicts.push(format!(
                            "Original location occupied: {}",
                            entry.from.display()
                        ));
                    }
                }
                (OperationKind::Transform, None) => {
                    if !entry.to.exists() {
                        conflicts.push(format!("Output not found: {}", entry.to.display()));
                    }
                }
                (OperationKind::Move, _) => {
                    if !entry.to.exists() {
                        conflicts.push(format!("File not found at target: {}", entry.to.display()));
                    }
                    if occupied(&entry.from) {
                        conflicts.push(format!(
                            "Original location occupied: {}",
                            entry.from.display()
                        ));
                    }
                }
            }
        }

        conflicts
    }

    /// Reverse one entry. Returns false when there was nothing to do.
    ///
    /// `current` is where the moved file is now: `entry.to`, or the staging
    /// path it was parked at.
    fn undo_entry(&self, entry: &JournalEntry, current: &Path) -> Result<bool> {
        match (entry.kind, &entry.backup) {
            (OperationKind::Move, _) => {
                if !current.exists() {
                    tracing::warn!("Moved file not found, skipping: {:?}", current);
                    return Ok(false);
                }
                if entry.from.exists() {
                    return Err(crate::Error::UndoConflict(format!(
                        "Original location occupied: {}",
                        entry.from.display()
                    )));
                }
                ensure_parent(&entry.from)?;
                move_file(current, &entry.from)?;
                tracing::debug!("Moved back: {:?} -> {:?}", current, entry.from);
                Ok(true)
            }
            (OperationKind::Transform, Some(backup)) => {
                if !backup.exists() {
                    return Err(crate::Error::UndoConflict(format!(
                        "Staged original missing: {}",
                        backup.display()
                    )));
                }
                if entry.from != entry.to && entry.from.exists() {
                    return Err(crate::Error::UndoConflict(format!(
                        "Original location occupied: {}",
                        entry.from.display()
                    )));
                }
                if entry.to.is_file() {
                    remove_file(&entry.to)?;
                }
                ensure_parent(&entry.from)?;
                move_file(backup, &entry.from)?;
                tracing::debug!("Restored: {:?} -> {:?}", backup, entry.from);
                Ok(true)
            }
            (OperationKind::Transform, None) => {
                if !entry.to.is_file() {
                    tracing::debug!("Output already removed, skipping: {:?}", entry.to);
                    return Ok(false);
                }
                remove_file(&entry.to)?;
                tracing::debug!("Removed output: {:?}", entry.to);
                Ok(true)
            }
            (OperationKind::Delete, _) => Ok(false),
        }
    }
}

fn describe(entry: &JournalEntry) -> String {
    match (entry.kind, &entry.backup) {
        (OperationKind::Transform, Some(backup)) => format!(
            "Replace {} with {}",
            entry.to.display(),
            backup.display()
        ),
        (OperationKind::Transform, None) => format!("Remove {}", entry.to.display()),
        _ => format!("Move {} -> {}", entry.to.display(), entry.from.display()),
    }
}

/// Result of an undo.
#[derive(Debug, Default)]
pub struct RollbackResult {
    /// Number of reversed entries (or entries that would be, in a dry run).
    pub success_count: usize,
    /// Number of skipped entries.
    pub skip_count: usize,
    /// Number of failed entries.
    pub error_count: usize,
    /// Conflicts found before starting.
    pub conflicts: Vec<String>,
    /// Dry-run actions.
    pub planned: Vec<String>,
    /// Skip reasons worth showing.
    pub skipped: Vec<String>,
    /// Error messages.
    pub errors: Vec<String>,
}

impl RollbackResult {
    /// Check if the undo was successful.
    pub fn is_success(&self) -> bool {
        self.error_count == 0
    }

    /// Print summary.
    pub fn print_summary(&self) {
        println!("{}", "[Undo Summary]".bold().green());
        println!("  {} {}", "Successful:".bold(), self.success_count);
        println!("  {} {}", "Skipped:".bold(), self.skip_count);
        println!("  {} {}", "Failed:".bold(), self.error_count);

        if !self.skipped.is_empty() {
            println!();
            for skipped in &self.skipped {
                println!("  - {}", skipped.yellow());
            }
        }

        if !self.errors.is_empty() {
            println!();
            println!("{}", "[Errors]".bold().red());
            for error in &self.errors {
                println!("  - {}", error);
            }
        }
    }
}

/// Undo a journal (convenience function).
pub fn undo(journal: &Journal, dry_run: bool) -> RollbackResult {
    RollbackExecutor::new(dry_run).execute(journal)
}

/// Load a journal from a JSON file.
pub fn load_journal(path: &Path) -> Result<Journal> {
    let content = fs::read_to_string(path)?;
    let journal: Journal = serde_json::from_str(&content)
        .map_err(|e| crate::Error::InvalidJournalFile(format!("{}: {}", path.display(), e)))?;
    if journal.version != JOURNAL_VERSION {
        return Err(crate::Error::InvalidJournalFile(format!(
            "Unsupported journal version: {}",
            journal.version
        )));
    }
    Ok(journal)
}

/// Save a journal to a JSON file.
pub fn save_journal(journal: &Journal, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(journal)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;

    tracing::info!("Journal saved to {:?}", path);
    Ok(())
}

/// Default journal location inside the log directory.
pub fn default_journal_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("journal_{}.json", Utc::now().format("%Y%m%d_%H%M%S")))
}
