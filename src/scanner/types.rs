use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions (lowercase) accepted as audio by the module firmware
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "wma"];

/// OS metadata entries that are treated as hidden regardless of their name
const OS_METADATA: &[&str] = &[
    "System Volume Information",
    "$RECYCLE.BIN",
    "Thumbs.db",
    "desktop.ini",
];

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Failed to read directory: {0}")]
    IoError(#[from] std::io::Error),
}

/// Folders whose names are fixed by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpecialTag {
    Mp3,
    Advert,
}

impl SpecialTag {
    /// Case-sensitive match on the folder name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MP3" => Some(SpecialTag::Mp3),
            "ADVERT" => Some(SpecialTag::Advert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialTag::Mp3 => "MP3",
            SpecialTag::Advert => "ADVERT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderKind {
    Regular,
    Special(SpecialTag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    RegularFolder,
    SpecialFolder(SpecialTag),
    RootFile,
    Audio,
    Foreign,
}

/// Why an entry is slated for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignReason {
    Hidden,
    RootFile,
    NotAudio,
    NestedDirectory,
    EmptyFolder,
}

impl ForeignReason {
    pub fn description(&self) -> &'static str {
        match self {
            ForeignReason::Hidden => "hidden or system entry",
            ForeignReason::RootFile => "file in the root directory",
            ForeignReason::NotAudio => "not an audio file",
            ForeignReason::NestedDirectory => "nested directory",
            ForeignReason::EmptyFolder => "folder without audio files",
        }
    }
}

impl fmt::Display for ForeignReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Snapshot of one filesystem object found by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name for display, sorting and classification. Bytes that are not
    /// valid UTF-8 show up as U+FFFD.
    pub name: String,
    /// Name as stored on disk
    pub file_name: OsString,
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Lowercased extension, empty when there is none
    pub extension: String,
    pub is_dir: bool,
}

impl Entry {
    pub fn new(file_name: OsString, path: PathBuf, kind: EntryKind, is_dir: bool) -> Self {
        let extension = if is_dir {
            String::new()
        } else {
            extension_of(&file_name)
        };

        Self {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            path,
            kind,
            extension,
            is_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignEntry {
    pub entry: Entry,
    pub reason: ForeignReason,
}

/// An accepted folder with its audio files and the foreign entries inside it
#[derive(Debug, Clone)]
pub struct FolderContents {
    pub folder: Entry,
    pub kind: FolderKind,
    pub audio: Vec<Entry>,
    pub foreign: Vec<ForeignEntry>,
}

impl FolderContents {
    pub fn name(&self) -> &str {
        &self.folder.name
    }
}

/// Classified result of scanning a root directory
#[derive(Debug, Clone)]
pub struct Inventory {
    pub root: PathBuf,
    pub folders: Vec<FolderContents>,
    /// Foreign entries directly under the root
    pub foreign: Vec<ForeignEntry>,
}

impl Inventory {
    pub fn regular_folders(&self) -> impl Iterator<Item = &FolderContents> {
        self.folders
            .iter()
            .filter(|f| f.kind == FolderKind::Regular)
    }

    pub fn special_folders(&self) -> impl Iterator<Item = &FolderContents> {
        self.folders
            .iter()
            .filter(|f| matches!(f.kind, FolderKind::Special(_)))
    }

    /// Regular folders that contain no audio files
    pub fn empty_folders(&self) -> impl Iterator<Item = &FolderContents> {
        self.regular_folders().filter(|f| f.audio.is_empty())
    }

    /// Every foreign entry, root-level first, then per folder
    pub fn all_foreign(&self) -> impl Iterator<Item = &ForeignEntry> {
        self.foreign
            .iter()
            .chain(self.folders.iter().flat_map(|f| f.foreign.iter()))
    }

    pub fn audio_count(&self) -> usize {
        self.folders.iter().map(|f| f.audio.len()).sum()
    }

    /// Move regular folders without audio files to the root-level foreign
    /// list. Their own foreign children go with them.
    pub fn prune_empty_folders(&mut self) -> usize {
        let (empty, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.folders)
            .into_iter()
            .partition(|f| f.kind == FolderKind::Regular && f.audio.is_empty());

        self.folders = kept;
        let count = empty.len();

        for folder in empty {
            self.foreign.push(ForeignEntry {
                entry: Entry {
                    kind: EntryKind::Foreign,
                    ..folder.folder
                },
                reason: ForeignReason::EmptyFolder,
            });
        }

        count
    }
}

pub fn extension_of(name: &OsStr) -> String {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || OS_METADATA.iter().any(|m| m.eq_ignore_ascii_case(name))
}

pub fn is_audio_extension(extension: &str) -> bool {
    AUDIO_EXTENSIONS.contains(&extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(OsStr::new("song.MP3")), "mp3");
        assert_eq!(extension_of(OsStr::new("archive.tar.gz")), "gz");
        assert_eq!(extension_of(OsStr::new("README")), "");
        assert_eq!(extension_of(OsStr::new(".hidden")), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_extension_of_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"Caf\xe9 Song.MP3");
        assert_eq!(extension_of(name), "mp3");

        let entry = Entry::new(name.to_os_string(), PathBuf::from("x"), EntryKind::Audio, false);
        assert_eq!(entry.name, "Caf\u{FFFD} Song.MP3");
        assert_eq!(entry.file_name, name);
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(".DS_Store"));
        assert!(is_hidden(".Spotlight-V100"));
        assert!(is_hidden("System Volume Information"));
        assert!(is_hidden("thumbs.db"));
        assert!(!is_hidden("Rock"));
    }

    #[test]
    fn test_special_tag_is_case_sensitive() {
        assert_eq!(SpecialTag::from_name("MP3"), Some(SpecialTag::Mp3));
        assert_eq!(SpecialTag::from_name("ADVERT"), Some(SpecialTag::Advert));
        assert_eq!(SpecialTag::from_name("mp3"), None);
        assert_eq!(SpecialTag::from_name("Advert"), None);
    }

    #[test]
    fn test_audio_extensions() {
        assert!(is_audio_extension("mp3"));
        assert!(is_audio_extension("wav"));
        assert!(is_audio_extension("wma"));
        assert!(!is_audio_extension("flac"));
        assert!(!is_audio_extension(""));
    }
}
