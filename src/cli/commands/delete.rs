//! Delete command implementation.
//!
//! Removes a whole tree in sequencer order: files, then folders deepest
//! first, then the root. Without `--yes` only the order is shown.

use super::execute::run_plan;
use crate::core::transform::MoveTransform;
use crate::core::{deletion, planner, scanner};
use crate::models::config::load_config;
use crate::models::rules::RuleSet;
use crate::utils::format::format_size;
use crate::utils::fs::ensure_directory;
use crate::Result;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Number of operations previewed without `--yes`.
const PREVIEW_LIMIT: usize = 20;

/// Execute the delete command.
pub async fn delete(root: &Path, exclude: &[PathBuf], yes: bool) -> Result<()> {
    println!("{}", "[DELETE] Deleting folder tree...".bold().cyan());
    println!();

    ensure_directory(root)?;
    let root = root.canonicalize()?;
    deletion::check_root(&root)?;

    let config = load_config();
    let inventory = scanner::scan_inventory(&root, &config.filters())?;
    let rules = exclude
        .iter()
        .map(|path| path.canonicalize().unwrap_or_else(|_| path.clone()))
        .fold(RuleSet::delete(), |rules, path| rules.exclude(path));
    let plan = planner::stamp(planner::plan(&inventory, &rules));

    println!("  {} {}", "Root:".bold(), root.display());
    println!("  {} {}", "Files:".bold(), inventory.file_count());
    println!("  {} {}", "Folders:".bold(), inventory.dir_count());
    println!("  {} {}", "Total size:".bold(), format_size(inventory.total_size()));
    println!();

    if !yes {
        println!("{}", "[DRY-RUN] Removal order:".bold().yellow());
        for op in plan.included().take(PREVIEW_LIMIT) {
            println!("  {}", op.source.display());
        }
        let remaining = plan.included().count().saturating_sub(PREVIEW_LIMIT);
        if remaining > 0 {
            println!("  ... and {} more", remaining);
        }
        println!();
        println!(
            "  Re-run with {} to delete.",
            format!("folder-organizer delete {} --yes", root.display()).cyan()
        );
        return Ok(());
    }

    println!("{}", "[WARNING] Files will be permanently deleted!".bold().red());
    println!();
    run_plan(plan, Box::new(MoveTransform), None, false).await?;
    Ok(())
}
