//! Execute command implementation.
//!
//! Reads a plan.json file, runs it on the executor worker while showing
//! progress, and writes a journal for undo.

use crate::core::executor::{ExecutionHandle, Executor};
use crate::core::planner;
use crate::core::progress::ProgressEvent;
use crate::core::rollback;
use crate::core::staging::purge_staging;
use crate::core::transform::{CommandTransform, CopyTransform, MoveTransform, Transform};
use crate::models::config::{load_config, Config};
use crate::models::outcome::{OutcomeStatus, TerminalEvent, TerminalStatus};
use crate::models::plan::Plan;
use crate::models::rules::Job;
use crate::utils::format::format_size;
use crate::Result;
use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

/// Execute a plan file.
pub async fn execute_plan(
    plan_file: &Path,
    command: Option<&str>,
    journal: Option<&Path>,
    keep_staging: bool,
) -> Result<()> {
    println!("{}", "[EXEC] Executing plan...".bold().cyan());
    println!();

    if !plan_file.exists() {
        return Err(crate::Error::PathNotFound(plan_file.display().to_string()));
    }

    println!("[INFO] Loading plan: {}", plan_file.display());
    let plan = planner::load_plan(plan_file)?;

    println!("  {} {}", "Root:".bold(), plan.root.display());
    println!("  {} {}", "Items:".bold(), plan.included().count());
    println!("  {} {}", "Changes:".bold(), plan.changes().count());
    println!();

    let transform: Box<dyn Transform> = match (&plan.rules.job, command) {
        (Job::Transform { .. }, Some(template)) => {
            Box::new(CommandTransform::from_template(template)?)
        }
        (Job::Transform { .. }, None) => Box::new(CopyTransform),
        _ => Box::new(MoveTransform),
    };

    println!("{}", "[WARNING] This will move and modify files!".bold().yellow());
    println!();

    run_plan(plan, transform, journal, keep_staging).await?;
    Ok(())
}

/// Run a plan with progress display, then save the journal and handle staging.
pub(crate) async fn run_plan(
    plan: Plan,
    transform: Box<dyn Transform>,
    journal: Option<&Path>,
    keep_staging: bool,
) -> Result<TerminalEvent> {
    let config = load_config();
    let (log_file, log_path) = open_run_log(&config)?;
    println!("[INFO] Run log: {}", log_path.display());

    let executor = Executor::with_config(config.executor_config());
    let total = plan.included().count();
    let mut handle = executor.start(plan.clone(), transform, Box::new(log_file))?;
    let event = watch(&mut handle, total).await?;

    print_summary(&event);

    let journal_path = match journal {
        Some(p) => p.to_path_buf(),
        None => rollback::default_journal_path(&config.log_dir),
    };
    rollback::save_journal(&rollback::build_journal(&plan, &event), &journal_path)?;
    println!("{} {}", "[OK] Journal saved to:".bold().green(), journal_path.display());

    handle_staging(&event, keep_staging)?;

    println!();
    println!("{}", "[Next Steps]".bold().yellow());
    println!(
        "  To undo changes: {}",
        format!("folder-organizer undo {}", journal_path.display()).cyan()
    );

    Ok(event)
}

fn open_run_log(config: &Config) -> Result<(fs::File, std::path::PathBuf)> {
    fs::create_dir_all(&config.log_dir)?;
    let path = config.log_dir.join(format!(
        "OrganizeLog_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let file = fs::File::create(&path)?;
    Ok((file, path))
}

/// Follow the progress channel until the terminal event. Ctrl-C cancels.
async fn watch(handle: &mut ExecutionHandle, total: usize) -> Result<TerminalEvent> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    loop {
        let interrupted = handle.is_cancel_requested();
        let next = tokio::select! {
            event = handle.next() => Some(event),
            _ = tokio::signal::ctrl_c(), if !interrupted => None,
        };

        let Some(event) = next else {
            handle.cancel();
            pb.println(format!(
                "{}",
                "[CANCEL] Stopping after the current item...".yellow()
            ));
            continue;
        };

        match event {
            Some(ProgressEvent::Log(line)) => tracing::debug!("{}", line),
            Some(ProgressEvent::Progress { completed, .. }) => pb.set_position(completed as u64),
            Some(ProgressEvent::Status(text)) => pb.set_message(text),
            Some(ProgressEvent::ItemFraction { index, fraction }) => {
                pb.set_message(format!("item {}: {:.0}%", index + 1, fraction * 100.0))
            }
            Some(ProgressEvent::Done(event)) => {
                pb.set_position(event.summary.processed as u64);
                pb.finish_with_message("Done!");
                println!();
                return Ok(*event);
            }
            None => {
                pb.abandon();
                return Err(crate::Error::ExecuteError(
                    "Worker stopped without a terminal event".to_string(),
                ));
            }
        }
    }
}

fn print_summary(event: &TerminalEvent) {
    let summary = &event.summary;
    let status = match event.status {
        TerminalStatus::Completed => event.status.to_string().green(),
        TerminalStatus::Cancelled => event.status.to_string().yellow(),
        TerminalStatus::Failed => event.status.to_string().red(),
    };

    println!("{}", "[Execution Summary]".bold().green());
    println!("  {} {}", "Status:".bold(), status);
    println!(
        "  {} {} of {}",
        "Processed:".bold(),
        summary.processed,
        summary.total
    );
    println!("  {} {}", "Succeeded:".bold(), summary.succeeded);
    println!("  {} {}", "Skipped:".bold(), summary.skipped);
    println!("  {} {}", "Failed:".bold(), summary.failed);
    if summary.restored > 0 || summary.unrecoverable > 0 {
        println!("  {} {}", "Originals restored:".bold(), summary.restored);
        if summary.unrecoverable > 0 {
            println!(
                "  {} {}",
                "Originals NOT restored:".bold().red(),
                summary.unrecoverable
            );
        }
    }
    println!(
        "  {} {} -> {} ({:+.1}%)",
        "Size:".bold(),
        format_size(summary.bytes_before),
        format_size(summary.bytes_after),
        summary.size_change_percent()
    );
    println!("  {} {:.1}s", "Elapsed:".bold(), summary.elapsed.as_secs_f64());
    if let Some(error) = &event.error {
        println!("  {} {}", "Error:".bold().red(), error);
    }

    let failures: Vec<_> = event
        .outcomes
        .iter()
        .filter(|o| o.status.is_failure())
        .collect();
    if !failures.is_empty() {
        println!();
        println!("{}", "[Failures]".bold().red());
        for outcome in failures {
            let detail = match &outcome.status {
                OutcomeStatus::Failed { reason } => reason.clone(),
                OutcomeStatus::RolledBack { reason } => format!("{} (original restored)", reason),
                OutcomeStatus::Unrecoverable { reason, backup } => {
                    format!("{} (original kept at {})", reason, backup.display())
                }
                _ => String::new(),
            };
            println!("  - {}: {}", outcome.source.display(), detail);
        }
    }
    println!();
}

/// Purge staging after a clean run, otherwise point at it.
fn handle_staging(event: &TerminalEvent, keep_staging: bool) -> Result<()> {
    if event.pending_staging_dirs.is_empty() {
        return Ok(());
    }

    let clean = event.status == TerminalStatus::Completed && event.summary.failed == 0;
    if clean && !keep_staging {
        let removed = purge_staging(&event.pending_staging_dirs)?;
        println!("[INFO] Purged {} staging folder(s)", removed);
        return Ok(());
    }

    println!();
    println!("{}", "[Staging]".bold().yellow());
    println!("  Staged originals were kept in:");
    for dir in &event.pending_staging_dirs {
        println!("    {}", dir.display());
    }
    println!(
        "  Remove them with: {}",
        "folder-organizer purge <DIR>...".cyan()
    );
    Ok(())
}
