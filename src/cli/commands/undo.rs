//! Undo command implementation.
//!
//! Reads a journal file and reverses the recorded operations, newest first.

use crate::core::rollback::{self, RollbackExecutor};
use crate::models::config::load_config;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Execute an undo.
pub async fn undo(journal_file: &Path, dry_run: bool) -> Result<()> {
    println!("{}", "[UNDO] Undo command".bold().cyan());
    println!();

    if !journal_file.exists() {
        return Err(crate::Error::PathNotFound(journal_file.display().to_string()));
    }

    println!("[INFO] Loading journal: {}", journal_file.display());
    let journal = rollback::load_journal(journal_file)?;

    println!("  {} {}", "Run ID:".bold(), journal.run_id);
    println!("  {} {}", "Executed at:".bold(), journal.executed_at);
    println!("  {} {}", "Root:".bold(), journal.root.display());
    println!("  {} {}", "Operations:".bold(), journal.entries.len());
    println!();

    if dry_run {
        println!("{}", "[DRY-RUN] Showing what would be done:".bold().yellow());
    } else {
        println!(
            "{}",
            "[WARNING] This will reverse all recorded operations!".bold().yellow()
        );
    }
    println!();

    let config = load_config();
    let result = RollbackExecutor::new(dry_run)
        .with_staging_dir_name(config.staging_dir_name)
        .execute(&journal);

    if !result.conflicts.is_empty() {
        println!("{}", "[Conflicts]".bold().yellow());
        for conflict in &result.conflicts {
            println!("  - {}", conflict);
        }
        println!();
    }
    for action in &result.planned {
        println!("  {} {}", "[DRY RUN]".yellow(), action);
    }
    if !result.planned.is_empty() {
        println!();
    }

    result.print_summary();
    println!();

    if !result.is_success() {
        println!("{}", "[WARNING] Undo completed with errors".yellow());
    } else if dry_run {
        println!("{}", "[OK] Dry run complete - no changes were made".green());
        println!(
            "  To actually undo: {}",
            format!("folder-organizer undo {}", journal_file.display()).bold()
        );
    } else {
        println!("{}", "[OK] Undo completed successfully!".green());
    }

    Ok(())
}
