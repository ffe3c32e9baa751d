use clap::Parser;
use dfrename::cli::Args;
use dfrename::confirm::{AutoConfirm, Confirm, TerminalPrompt};
use dfrename::engine::{organize, EmptyFolderPolicy, RunOptions};
use dfrename::error::AppError;
use dfrename::fs::StdFs;
use dfrename::logging;
use dfrename::output::{display_dry_run, display_execution_result, display_plan_json};
use dfrename::progress::{should_use_colors, Progress};
use tracing::{debug, error};

fn main() {
    let args = Args::parse();

    logging::init(args.verbose);

    if let Err(e) = run(args) {
        if e.is_graceful() {
            debug!("{}", e);
        } else {
            error!("{}", e);
        }
        eprintln!("\nError: {}", e.detailed_message());
        std::process::exit(e.exit_code().into());
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let mut progress = Progress::new_with_ui(args.verbose > 0, should_use_colors());

    let options = RunOptions {
        dry_run: args.dry,
        empty_folders: if args.prune_empty {
            EmptyFolderPolicy::Remove
        } else {
            EmptyFolderPolicy::Keep
        },
        ..Default::default()
    };

    debug!(root = ?args.root, options = ?options, "Starting run");

    let mut confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(TerminalPrompt)
    };

    let outcome = organize(&args.root, &options, &StdFs, confirm.as_mut(), &mut progress)?;

    let mut stdout = std::io::stdout();
    let shown = if args.json {
        display_plan_json(&outcome, &mut stdout)
    } else if outcome.dry_run {
        display_dry_run(&outcome, &mut stdout)
    } else {
        display_execution_result(&outcome, &mut stdout)
    };
    shown.map_err(|e| AppError::Other(format!("Failed to display output: {}", e)))?;

    if let Some(report) = &outcome.report {
        progress.run_complete(report.folders_renamed(), report.files_renamed(), false);
    } else {
        progress.run_complete(outcome.plan.folder_changes(), outcome.plan.file_changes(), true);
    }

    Ok(())
}
