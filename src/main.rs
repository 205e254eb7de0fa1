//! Folder Organizer CLI
//!
//! A command-line tool for flattening, renaming, converting and deleting
//! folder trees in batches without losing data.

use clap::Parser;
use folder_organizer::cli::{
    args::{Cli, Commands},
    commands::{delete, execute, plan, purge, undo},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run the appropriate command
    match cli.command {
        Commands::Plan {
            root,
            rules,
            output,
            all,
        } => {
            plan::plan(&root, &rules, output.as_deref(), all).await?;
        }

        Commands::Execute {
            plan_file,
            command,
            journal,
            keep_staging,
        } => {
            execute::execute_plan(
                &plan_file,
                command.as_deref(),
                journal.as_deref(),
                keep_staging,
            )
            .await?;
        }

        Commands::Delete { root, exclude, yes } => {
            delete::delete(&root, &exclude, yes).await?;
        }

        Commands::Undo {
            journal_file,
            dry_run,
        } => {
            undo::undo(&journal_file, dry_run).await?;
        }

        Commands::Purge { dirs } => {
            purge::purge(&dirs).await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("folder_organizer=debug")
    } else {
        EnvFilter::new("folder_organizer=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
