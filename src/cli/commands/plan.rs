//! Plan command implementation.
//!
//! Scans the root, builds the rule set from the command line, computes the
//! plan, prints a review table and saves the plan file.

use crate::cli::args::RuleArgs;
use crate::core::planner;
use crate::core::scanner;
use crate::models::config::load_config;
use crate::models::plan::{Plan, PlannedOperation};
use crate::utils::format::format_size;
use crate::utils::fs::ensure_directory;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Execute the plan command.
pub async fn plan(root: &Path, rule_args: &RuleArgs, output: Option<&Path>, all: bool) -> Result<()> {
    println!("{}", "[PLAN] Planning folder organization...".bold().cyan());
    println!();

    ensure_directory(root)?;
    let root = root.canonicalize()?;
    let config = load_config();

    let inventory = scanner::scan_inventory_excluding(
        &root,
        &config.filters(),
        &[config.staging_dir_name.as_str()],
    )?;
    println!("  {} {}", "Root:".bold(), root.display());
    println!("  {} {}", "Files:".bold(), inventory.file_count());
    println!("  {} {}", "Folders:".bold(), inventory.dir_count());
    println!("  {} {}", "Total size:".bold(), format_size(inventory.total_size()));
    println!();

    let mut rules = rule_args.to_rules(config.filters());
    // Scanned paths are canonical, so exclusions must be too.
    rules.excluded = rules
        .excluded
        .iter()
        .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()))
        .collect();
    let plan = planner::stamp(planner::plan(&inventory, &rules));

    print_review(&plan, all);

    let changes = plan.changes().count();
    let excluded = plan.operations.iter().filter(|op| !op.included).count();
    println!();
    println!("{}", "[Plan Summary]".bold().green());
    println!("  {} {}", "Items:".bold(), plan.len());
    println!("  {} {}", "Changes:".bold(), changes);
    println!("  {} {}", "Unchanged:".bold(), plan.included().count() - changes);
    println!("  {} {}", "Excluded:".bold(), excluded);
    if plan.uses_staging() {
        println!(
            "  {} originals are staged in '{}' folders until purged",
            "Note:".bold(),
            config.staging_dir_name
        );
    }
    println!();

    let output_path = match output {
        Some(o) => o.to_path_buf(),
        None => planner::default_plan_path(&config.log_dir),
    };
    planner::save_plan(&plan, &output_path)?;
    println!("{} {}", "[OK] Plan saved to:".bold().green(), output_path.display());

    println!();
    println!("{}", "[Next Steps]".bold().yellow());
    println!(
        "  Execute the plan: {}",
        format!("folder-organizer execute {}", output_path.display()).cyan()
    );

    Ok(())
}

/// Print one line per operation, relative to the plan root.
fn print_review(plan: &Plan, all: bool) {
    println!("{}", "[Review]".bold());
    let mut shown = 0;
    for op in &plan.operations {
        let unchanged = op.is_noop();
        if !all && op.included && unchanged {
            continue;
        }
        shown += 1;
        println!("  {}", review_line(plan, op));
    }
    if shown == 0 {
        println!("  {}", "Nothing to change".dimmed());
    }
}

fn review_line(plan: &Plan, op: &PlannedOperation) -> String {
    let rel = |p: &Path| {
        p.strip_prefix(&plan.root)
            .unwrap_or(p)
            .display()
            .to_string()
    };
    if !op.included {
        return format!("[ ] {}", rel(&op.source)).dimmed().to_string();
    }
    if op.is_noop() {
        return format!("[x] {}", rel(&op.source)).dimmed().to_string();
    }
    let staged = if op.staged { " (staged)" } else { "" };
    format!(
        "[x] {} {} {}{}",
        rel(&op.source),
        "->".green(),
        rel(&op.destination).green(),
        staged
    )
}
