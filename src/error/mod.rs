mod codes;

pub use codes::ExitCode;

use crate::cleanup::CleanupError;
use crate::plan::PlanError;
use crate::renamer::{EntryState, ExecutionReport, Phase, RenameError};
use crate::scanner::ScannerError;
use std::path::PathBuf;
use thiserror::Error;

/// How many report entries are listed per state in a failure message
const REPORT_LIST_LIMIT: usize = 10;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Target directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Path is not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("Permission denied: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Capacity exceeded: {count} (maximum {max})")]
    CapacityExceeded {
        /// `None` when the number of folders is the problem
        folder: Option<String>,
        count: usize,
        max: usize,
    },

    #[error("Aborted: {stage} was not confirmed")]
    ConfirmationDeclined { stage: String },

    #[error("Cleanup failed: {}", .path.display())]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rename failed in {phase}: {} -> {}", .from.display(), .to.display())]
    RenameFailure {
        phase: Phase,
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
        report: ExecutionReport,
    },

    #[error("Inconsistent tree in {}: {detail}", .dir.display())]
    InconsistentState { dir: PathBuf, detail: String },

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::DirectoryNotFound { .. } => ExitCode::DirectoryNotFound,
            AppError::NotADirectory { .. } => ExitCode::DirectoryNotFound,
            AppError::PermissionDenied { .. } => ExitCode::PermissionError,
            AppError::CapacityExceeded { .. } => ExitCode::CapacityExceeded,
            AppError::ConfirmationDeclined { .. } => ExitCode::ConfirmationDeclined,
            AppError::CleanupFailed { .. } => ExitCode::CleanupError,
            AppError::RenameFailure { .. } => ExitCode::RenameError,
            AppError::InconsistentState { .. } => ExitCode::InconsistentState,
            AppError::Other(_) => ExitCode::GeneralError,
        }
    }

    /// True for aborts that leave the tree untouched on purpose
    pub fn is_graceful(&self) -> bool {
        matches!(self, AppError::ConfirmationDeclined { .. })
    }

    pub fn detailed_message(&self) -> String {
        match self {
            AppError::DirectoryNotFound { path } => {
                format!(
                    "The specified directory does not exist:\n  {}\n\n\
                     Please verify the path and try again.",
                    path.display()
                )
            }

            AppError::NotADirectory { path } => {
                format!(
                    "The specified path is not a directory:\n  {}\n\n\
                     Please provide the root directory of the SD card.",
                    path.display()
                )
            }

            AppError::PermissionDenied { path } => {
                format!(
                    "Permission denied when accessing:\n  {}\n\n\
                     Please check file permissions or run with appropriate privileges.",
                    path.display()
                )
            }

            AppError::CapacityExceeded { folder, count, max } => match folder {
                Some(folder) => format!(
                    "Folder '{}' contains {} audio files, but at most {} are supported.\n\n\
                     Split the folder before running again. Nothing was changed.",
                    folder, count, max
                ),
                None => format!(
                    "Found {} folders, but the DFPlayer Mini supports at most {}.\n\n\
                     Merge folders before running again. Nothing was changed.",
                    count, max
                ),
            },

            AppError::ConfirmationDeclined { stage } => {
                format!("The {} was declined. Nothing was changed.", stage)
            }

            AppError::CleanupFailed { path, source } => {
                format!(
                    "Failed to delete:\n  {}\nError: {}\n\n\
                     No renames were started. Fix the problem and run again.",
                    path.display(),
                    source
                )
            }

            AppError::RenameFailure {
                phase,
                from,
                to,
                source,
                report,
            } => {
                let mut msg = format!(
                    "Failed to rename during {}:\n\
                     From:  {}\n\
                     To:    {}\n\
                     Error: {}\n\n",
                    phase,
                    from.display(),
                    to.display(),
                    source
                );
                msg.push_str(&describe_report(report));
                msg.push_str(
                    "\nEntries under temporary names are safe. Run the tool again \
                     to finish; nothing was deleted.",
                );
                msg
            }

            AppError::InconsistentState { dir, detail } => {
                format!(
                    "The directory no longer matches the rename plan:\n  {}\n  {}\n\n\
                     Another program may have changed the tree. Run again to re-plan.",
                    dir.display(),
                    detail
                )
            }

            AppError::Other(message) => message.clone(),
        }
    }
}

fn describe_report(report: &ExecutionReport) -> String {
    let mut msg = format!(
        "State at the time of failure:\n\
         - {} renamed\n\
         - {} staged under temporary names\n\
         - {} not yet moved\n",
        report.count(EntryState::Renamed),
        report.count(EntryState::Staged),
        report.count(EntryState::Pending),
    );

    for state in [EntryState::Staged, EntryState::Pending] {
        let entries: Vec<_> = report.with_state(state).collect();
        if entries.is_empty() {
            continue;
        }
        msg.push_str(&format!("\n{}:\n", state));
        for entry in entries.iter().take(REPORT_LIST_LIMIT) {
            let shown = match state {
                EntryState::Staged => entry.temporary_path(),
                _ => entry.current_path(),
            };
            msg.push_str(&format!("  - {} (-> {})\n", shown.display(), entry.target));
        }
        if entries.len() > REPORT_LIST_LIMIT {
            msg.push_str(&format!(
                "  ... and {} more\n",
                entries.len() - REPORT_LIST_LIMIT
            ));
        }
    }

    msg
}

impl From<ScannerError> for AppError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::PathNotFound(path) => AppError::DirectoryNotFound { path },
            ScannerError::NotADirectory(path) => AppError::NotADirectory { path },
            ScannerError::PermissionDenied(path) => AppError::PermissionDenied { path },
            ScannerError::IoError(e) => AppError::Other(format!("I/O error: {}", e)),
        }
    }
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::TooManyFolders { count, max } => AppError::CapacityExceeded {
                folder: None,
                count,
                max,
            },
            PlanError::TooManyFiles { folder, count, max } => AppError::CapacityExceeded {
                folder: Some(folder),
                count,
                max,
            },
        }
    }
}

impl From<CleanupError> for AppError {
    fn from(err: CleanupError) -> Self {
        match err {
            CleanupError::RemoveFailed { path, source } => AppError::CleanupFailed { path, source },
        }
    }
}

impl From<RenameError> for AppError {
    fn from(err: RenameError) -> Self {
        match err {
            RenameError::Failed {
                phase,
                from,
                to,
                source,
                report,
            } => AppError::RenameFailure {
                phase,
                from,
                to,
                source,
                report,
            },
            RenameError::Inconsistent { dir, detail } => {
                AppError::InconsistentState { dir, detail }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renamer::ReportEntry;

    #[test]
    fn test_exit_codes() {
        let err = AppError::DirectoryNotFound {
            path: PathBuf::from("/test"),
        };
        assert_eq!(err.exit_code(), ExitCode::DirectoryNotFound);

        let err = AppError::CapacityExceeded {
            folder: None,
            count: 100,
            max: 99,
        };
        assert_eq!(err.exit_code(), ExitCode::CapacityExceeded);

        let err = AppError::ConfirmationDeclined {
            stage: "cleanup".to_string(),
        };
        assert_eq!(err.exit_code(), ExitCode::ConfirmationDeclined);
        assert!(err.is_graceful());
    }

    #[test]
    fn test_capacity_message_names_folder() {
        let err: AppError = PlanError::TooManyFiles {
            folder: "Audiobooks".to_string(),
            count: 300,
            max: 255,
        }
        .into();

        let msg = err.detailed_message();
        assert!(msg.contains("Audiobooks"));
        assert!(msg.contains("300"));
        assert!(msg.contains("255"));
    }

    #[test]
    fn test_rename_failure_lists_report() {
        let entry = |current: &str, state| ReportEntry {
            dir: PathBuf::from("/sd/Rock"),
            current: current.into(),
            temporary: "__dftmp0_002.mp3".to_string(),
            target: "002.mp3".to_string(),
            is_folder: false,
            state,
        };
        let err = AppError::RenameFailure {
            phase: Phase::Finalizing,
            from: PathBuf::from("/sd/Rock/__dftmp0_002.mp3"),
            to: PathBuf::from("/sd/Rock/002.mp3"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            report: ExecutionReport {
                entries: vec![
                    entry("a.mp3", EntryState::Renamed),
                    entry("b.mp3", EntryState::Staged),
                ],
            },
        };

        let msg = err.detailed_message();
        assert!(msg.contains("phase 2"));
        assert!(msg.contains("1 renamed"));
        assert!(msg.contains("1 staged"));
        assert!(msg.contains("/sd/Rock/__dftmp0_002.mp3 (-> 002.mp3)"));
        assert_eq!(err.exit_code(), ExitCode::RenameError);
    }

    #[test]
    fn test_scanner_error_conversion() {
        let scanner_err = ScannerError::PathNotFound(PathBuf::from("/missing"));
        let app_err: AppError = scanner_err.into();
        assert_eq!(app_err.exit_code(), ExitCode::DirectoryNotFound);
    }
}
