//! Two-phase execution of a rename plan.
//!
//! Every entry is first moved to a temporary name (phase 1) and then to its
//! final name (phase 2). Temporary names never equal a current or final name,
//! so no rename ever lands on a live entry. Each folder's files form one
//! group and the regular folders form the last group, so file paths are
//! always built from their folder's current name.
//!
//! Within a group both phases run in plan order. A crash therefore leaves
//! either a staged prefix (phase 1 interrupted) or a staged suffix (phase 2
//! interrupted), which is how a re-run finds where to continue.

mod recovery;
mod report;
mod staging;

pub use recovery::*;
pub use report::*;
pub use staging::*;

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fs::Filesystem;
use crate::plan::RenamePlan;
use crate::progress::Progress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Current name to temporary name
    Staging,
    /// Temporary name to final name
    Finalizing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Staging => f.write_str("phase 1 (current -> temporary)"),
            Phase::Finalizing => f.write_str("phase 2 (temporary -> final)"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RenameError {
    #[error("Rename failed in {phase}: {} -> {}: {source}", .from.display(), .to.display())]
    Failed {
        phase: Phase,
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
        report: ExecutionReport,
    },

    #[error("Cannot determine rename progress in {}: {detail}", .dir.display())]
    Inconsistent { dir: PathBuf, detail: String },
}

/// Where a group stands on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resume {
    /// Every entry at its current name
    Fresh,
    /// The first `n` entries are staged, the rest are untouched
    Staging(usize),
    /// The first `n` entries are final, the rest are staged
    Finalizing(usize),
    /// Every entry at its final name
    Complete,
}

pub struct TwoPhaseRenamer<'a, F: Filesystem> {
    fs: &'a F,
    staging: Staging,
}

impl<'a, F: Filesystem> TwoPhaseRenamer<'a, F> {
    pub fn new(fs: &'a F, staging: Staging) -> Self {
        Self { fs, staging }
    }

    /// Execute `plan`, continuing from wherever an earlier run with the same
    /// plan and staging stopped.
    pub fn execute(
        &self,
        plan: &RenamePlan,
        progress: &mut Progress,
    ) -> Result<ExecutionReport, RenameError> {
        let (mut report, file_groups, folder_group) = self.prepare(plan);

        info!(
            nonce = self.staging.nonce(),
            entries = report.entries.len(),
            "Executing rename plan"
        );

        let folder_resume = self.resume_point(&report, &folder_group)?;

        if !folder_group.is_empty() && folder_resume != Resume::Fresh {
            // Folders are only touched once every file group is done.
            info!("Folder renames already started, file renames are complete");
            for &i in file_groups.iter().flatten() {
                report.entries[i].state = EntryState::Renamed;
            }
        } else {
            for group in &file_groups {
                self.run_group(&mut report, group, progress)?;
            }
        }

        self.run_group(&mut report, &folder_group, progress)?;

        info!(
            folders = report.folders_renamed(),
            files = report.files_renamed(),
            "Rename plan executed"
        );

        Ok(report)
    }

    /// Build the report skeleton and the index groups (files per folder,
    /// then the folders themselves). Identities are left out entirely.
    fn prepare(&self, plan: &RenamePlan) -> (ExecutionReport, Vec<Vec<usize>>, Vec<usize>) {
        let mut report = ExecutionReport::default();
        let mut file_groups: Vec<Vec<usize>> = Vec::new();
        let mut folder_group = Vec::new();

        for staged in self.staging.stage(plan) {
            let index = report.entries.len();
            if staged.is_folder {
                folder_group.push(index);
            } else {
                match file_groups.last_mut() {
                    Some(group) if report.entries[group[0]].dir == staged.dir => group.push(index),
                    _ => file_groups.push(vec![index]),
                }
            }
            report.entries.push(staged.into());
        }

        (report, file_groups, folder_group)
    }

    fn resume_point(&self, report: &ExecutionReport, group: &[usize]) -> Result<Resume, RenameError> {
        let entries: Vec<&ReportEntry> = group.iter().map(|&i| &report.entries[i]).collect();

        let first = match entries.first() {
            Some(first) => first,
            None => return Ok(Resume::Complete),
        };

        let staged: Vec<bool> = entries
            .iter()
            .map(|e| self.fs.exists(&e.temporary_path()))
            .collect();

        let leading = staged[0];
        let run = staged.iter().take_while(|&&s| s == leading).count();

        if staged[run..].iter().any(|&s| s == leading) {
            return Err(RenameError::Inconsistent {
                dir: first.dir.clone(),
                detail: String::from("staged entries are not contiguous in plan order"),
            });
        }

        let resume = match (leading, run == entries.len()) {
            (true, true) => Resume::Finalizing(0),
            (true, false) => Resume::Staging(run),
            (false, false) => Resume::Finalizing(run),
            (false, true) => {
                if entries.iter().all(|e| self.fs.exists(&e.current_path())) {
                    Resume::Fresh
                } else if entries.iter().all(|e| self.fs.exists(&e.target_path())) {
                    Resume::Complete
                } else {
                    let missing: Vec<_> = entries
                        .iter()
                        .filter(|e| !self.fs.exists(&e.current_path()))
                        .map(|e| e.current.to_string_lossy())
                        .collect();
                    return Err(RenameError::Inconsistent {
                        dir: first.dir.clone(),
                        detail: format!("missing entries: {}", missing.join(", ")),
                    });
                }
            }
        };

        debug!(dir = ?first.dir, resume = ?resume, "Resume point");
        Ok(resume)
    }

    fn run_group(
        &self,
        report: &mut ExecutionReport,
        group: &[usize],
        progress: &mut Progress,
    ) -> Result<(), RenameError> {
        let resume = self.resume_point(report, group)?;

        let (stage_from, finalize_from) = match resume {
            Resume::Complete => {
                for &i in group {
                    report.entries[i].state = EntryState::Renamed;
                }
                return Ok(());
            }
            Resume::Fresh => (Some(0), 0),
            Resume::Staging(n) => {
                warn!(done = n, total = group.len(), "Resuming interrupted phase 1");
                (Some(n), 0)
            }
            Resume::Finalizing(n) => {
                warn!(done = n, total = group.len(), "Resuming interrupted phase 2");
                for &i in &group[..n] {
                    report.entries[i].state = EntryState::Renamed;
                }
                (None, n)
            }
        };

        if let Some(from) = stage_from {
            for &i in &group[..from] {
                report.entries[i].state = EntryState::Staged;
            }
            for &i in &group[from..] {
                self.move_entry(report, i, Phase::Staging)?;
            }
        }

        for &i in &group[finalize_from..] {
            self.move_entry(report, i, Phase::Finalizing)?;

            let entry = &report.entries[i];
            progress.rename_progress(i + 1, report.entries.len(), &label(entry), &entry.target);
        }

        Ok(())
    }

    fn move_entry(
        &self,
        report: &mut ExecutionReport,
        index: usize,
        phase: Phase,
    ) -> Result<(), RenameError> {
        let entry = &report.entries[index];
        let (from, to, next) = match phase {
            Phase::Staging => (entry.current_path(), entry.temporary_path(), EntryState::Staged),
            Phase::Finalizing => (entry.temporary_path(), entry.target_path(), EntryState::Renamed),
        };

        // std::fs::rename replaces existing files, so check first.
        let result = if self.fs.exists(&to) {
            Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "target already exists",
            ))
        } else {
            self.fs.rename(&from, &to)
        };

        if let Err(source) = result {
            warn!(phase = %phase, from = ?from, to = ?to, error = %source, "Rename failed");
            return Err(RenameError::Failed {
                phase,
                from,
                to,
                source,
                report: report.clone(),
            });
        }

        debug!(phase = %phase, from = ?from, to = ?to, "Renamed");
        report.entries[index].state = next;
        Ok(())
    }
}

/// `folder/name` for files, `name` for folders
fn label(entry: &ReportEntry) -> String {
    let name = entry.current.to_string_lossy();
    match entry.dir.file_name() {
        Some(dir) if !entry.is_folder => format!("{}/{}", dir.to_string_lossy(), name),
        _ => name.into_owned(),
    }
}
