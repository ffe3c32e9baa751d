use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use super::StagedRename;

/// Where an entry is on disk relative to its two-phase rename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Still at its current name
    Pending,
    /// Moved to its temporary name
    Staged,
    /// At its final name
    Renamed,
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryState::Pending => "pending",
            EntryState::Staged => "staged",
            EntryState::Renamed => "renamed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Parent directory at the time the entry is renamed
    pub dir: PathBuf,
    pub current: OsString,
    pub temporary: String,
    pub target: String,
    pub is_folder: bool,
    pub state: EntryState,
}

impl From<StagedRename> for ReportEntry {
    fn from(staged: StagedRename) -> Self {
        Self {
            dir: staged.dir,
            current: staged.current,
            temporary: staged.temporary,
            target: staged.target,
            is_folder: staged.is_folder,
            state: EntryState::Pending,
        }
    }
}

impl ReportEntry {
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(&self.current)
    }

    pub fn temporary_path(&self) -> PathBuf {
        self.dir.join(&self.temporary)
    }

    pub fn target_path(&self) -> PathBuf {
        self.dir.join(&self.target)
    }
}

/// Per-entry outcome of executing a rename plan. Entries already at their
/// final name are not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub entries: Vec<ReportEntry>,
}

impl ExecutionReport {
    pub fn count(&self, state: EntryState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }

    pub fn with_state(&self, state: EntryState) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.state == state)
    }

    pub fn folders_renamed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.is_folder && e.state == EntryState::Renamed)
            .count()
    }

    pub fn files_renamed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.is_folder && e.state == EntryState::Renamed)
            .count()
    }

    /// True when every entry is at its final name
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|e| e.state == EntryState::Renamed)
    }
}
