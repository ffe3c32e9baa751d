use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

use crate::scanner::{FolderKind, SpecialTag};

/// The firmware addresses at most 99 numbered folders
pub const MAX_REGULAR_FOLDERS: usize = 99;

/// Width of a numbered folder name (`01`..`99`)
pub const FOLDER_NAME_WIDTH: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Too many folders: {count} (maximum {max})")]
    TooManyFolders { count: usize, max: usize },

    #[error("Too many audio files in '{folder}': {count} (maximum {max})")]
    TooManyFiles {
        folder: String,
        count: usize,
        max: usize,
    },
}

/// File numbering rules for one kind of folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamingScheme {
    /// Minimum zero-padded width of the file number
    pub file_width: usize,
    pub max_files: usize,
}

impl NamingScheme {
    pub fn for_kind(kind: FolderKind) -> Self {
        match kind {
            FolderKind::Regular => Self {
                file_width: 3,
                max_files: 255,
            },
            FolderKind::Special(SpecialTag::Mp3) => Self {
                file_width: 4,
                max_files: 65535,
            },
            FolderKind::Special(SpecialTag::Advert) => Self {
                file_width: 4,
                max_files: 255,
            },
        }
    }

    /// Final name of the `number`-th file (1-based)
    pub fn file_name(&self, number: usize, extension: &str) -> String {
        if extension.is_empty() {
            format!("{:0width$}", number, width = self.file_width)
        } else {
            format!("{:0width$}.{}", number, extension, width = self.file_width)
        }
    }
}

/// Final name of the `number`-th regular folder (1-based)
pub fn folder_name(number: usize) -> String {
    format!("{:0width$}", number, width = FOLDER_NAME_WIDTH)
}

/// Current and final name of one entry, relative to its parent directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameChange {
    /// Name as stored on disk, which need not be valid UTF-8
    #[serde(serialize_with = "serialize_lossy")]
    pub current: OsString,
    pub target: String,
}

impl NameChange {
    pub fn new(current: impl Into<OsString>, target: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            target: target.into(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.current == *self.target
    }

    /// Current name for display
    pub fn current_name(&self) -> Cow<'_, str> {
        self.current.to_string_lossy()
    }
}

fn serialize_lossy<S: Serializer>(name: &OsString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&name.to_string_lossy())
}

/// Planned names for one folder and the audio files inside it
#[derive(Debug, Clone, Serialize)]
pub struct FolderPlan {
    pub kind: FolderKind,
    pub folder: NameChange,
    pub files: Vec<NameChange>,
}

/// Complete set of renames for one run. Regular folders come first, in
/// numbering order, followed by the special folders.
#[derive(Debug, Clone, Serialize)]
pub struct RenamePlan {
    pub root: PathBuf,
    pub folders: Vec<FolderPlan>,
}

impl RenamePlan {
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn file_count(&self) -> usize {
        self.folders.iter().map(|f| f.files.len()).sum()
    }

    /// Folder renames that actually change a name
    pub fn folder_changes(&self) -> usize {
        self.folders
            .iter()
            .filter(|f| !f.folder.is_identity())
            .count()
    }

    /// File renames that actually change a name
    pub fn file_changes(&self) -> usize {
        self.folders
            .iter()
            .flat_map(|f| f.files.iter())
            .filter(|c| !c.is_identity())
            .count()
    }

    pub fn is_noop(&self) -> bool {
        self.folder_changes() == 0 && self.file_changes() == 0
    }

    /// Every name the plan refers to, current and final, files and folders
    pub fn all_names(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.folders.iter().flat_map(|f| {
            std::iter::once(&f.folder)
                .chain(f.files.iter())
                .flat_map(|c| [c.current_name(), Cow::Borrowed(c.target.as_str())])
        })
    }
}
