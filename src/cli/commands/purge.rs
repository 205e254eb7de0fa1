//! Purge command implementation.

use crate::core::staging::purge_staging;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Remove staging directories reported by an earlier run.
pub async fn purge(dirs: &[PathBuf]) -> Result<()> {
    let removed = purge_staging(dirs)?;
    println!(
        "{} {} staging folder(s) removed",
        "[OK]".bold().green(),
        removed
    );
    Ok(())
}
