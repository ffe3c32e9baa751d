use crate::cleanup::CleanupPlan;
use crate::engine::RunOutcome;
use crate::plan::RenamePlan;
use crate::renamer::LeftoverEntry;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Everything a dry run would do, as emitted by `--json`
#[derive(Debug, Serialize)]
pub struct PlanDocument<'a> {
    pub root: &'a Path,
    pub leftovers: &'a [LeftoverEntry],
    pub cleanup: &'a CleanupPlan,
    pub renames: &'a RenamePlan,
}

impl<'a> PlanDocument<'a> {
    pub fn from_outcome(outcome: &'a RunOutcome) -> Self {
        Self {
            root: &outcome.plan.root,
            leftovers: &outcome.leftovers,
            cleanup: &outcome.cleanup,
            renames: &outcome.plan,
        }
    }
}

/// List entries found under temporary names
pub fn display_leftovers(leftovers: &[LeftoverEntry], writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{} entries were left under temporary names by an interrupted run:",
        leftovers.len()
    )?;
    for entry in leftovers {
        writeln!(
            writer,
            "  {}  ->  {}",
            entry.current_path().display(),
            entry.target
        )?;
    }
    Ok(())
}

/// List everything the cleanup would delete
pub fn display_cleanup_plan(plan: &CleanupPlan, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;
    write!(writer, "{}", plan.summary())?;
    if plan.is_empty() {
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(writer)?;
    for item in &plan.items {
        let suffix = if item.is_dir { "/" } else { "" };
        writeln!(writer, "  {}{}  ({})", item.path.display(), suffix, item.reason)?;
    }
    Ok(())
}

/// List the rename plan folder by folder, then the folder renames
pub fn display_rename_plan(plan: &RenamePlan, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;

    if plan.folders.is_empty() {
        writeln!(writer, "No folders to rename.")?;
        return Ok(());
    }

    writeln!(writer, "File renames:")?;
    for folder in &plan.folders {
        writeln!(writer, "  [{}/]", folder.folder.current_name())?;
        if folder.files.is_empty() {
            writeln!(writer, "    (no audio files)")?;
        }
        for file in &folder.files {
            if file.is_identity() {
                writeln!(writer, "    {}  (unchanged)", file.current_name())?;
            } else {
                writeln!(writer, "    {}  ->  {}", file.current_name(), file.target)?;
            }
        }
    }

    writeln!(writer)?;
    writeln!(writer, "Folder renames:")?;
    for folder in &plan.folders {
        if folder.folder.is_identity() {
            writeln!(writer, "  {}/  (unchanged)", folder.folder.current_name())?;
        } else {
            writeln!(
                writer,
                "  {}/  ->  {}/",
                folder.folder.current_name(),
                folder.folder.target
            )?;
        }
    }

    writeln!(writer)?;
    writeln!(
        writer,
        "{} folders and {} files will be renamed.",
        plan.folder_changes(),
        plan.file_changes()
    )?;

    Ok(())
}

/// Write the planned run as pretty-printed JSON
pub fn display_plan_json(outcome: &RunOutcome, writer: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, &PlanDocument::from_outcome(outcome))?;
    writeln!(writer)
}

/// Display dry run results in a formatted output
pub fn display_dry_run(outcome: &RunOutcome, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "========================================")?;
    writeln!(writer, "              DRY RUN")?;
    writeln!(writer, "========================================")?;
    writeln!(writer)?;
    writeln!(writer, "Root: {}", outcome.plan.root.display())?;

    if !outcome.leftovers.is_empty() {
        display_leftovers(&outcome.leftovers, writer)?;
        writeln!(
            writer,
            "The plan below moves them to the names they were staged for."
        )?;
    }

    display_cleanup_plan(&outcome.cleanup, writer)?;
    display_rename_plan(&outcome.plan, writer)?;

    writeln!(writer)?;
    writeln!(writer, "Run without --dry to apply these changes.")?;

    Ok(())
}

/// Display execution results (non-dry-run)
pub fn display_execution_result(outcome: &RunOutcome, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;

    if !outcome.leftovers.is_empty() {
        writeln!(
            writer,
            "Finished {} renames left by an interrupted run.",
            outcome.leftovers.len()
        )?;
    }

    if outcome.removed > 0 {
        writeln!(writer, "Deleted {} entries.", outcome.removed)?;
    }

    match &outcome.report {
        Some(report) if report.folders_renamed() + report.files_renamed() > 0 => {
            writeln!(
                writer,
                "Renamed {} folder(s) and {} file(s).",
                report.folders_renamed(),
                report.files_renamed()
            )?;
        }
        _ => writeln!(writer, "Everything is already in order.")?,
    }

    Ok(())
}
