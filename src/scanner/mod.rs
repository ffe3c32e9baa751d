mod types;

pub use types::*;

use crate::natural::sort_natural;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// One child of a directory as returned by `read_children`
struct Child {
    file_name: OsString,
    path: PathBuf,
    is_dir: bool,
}

impl Child {
    /// Lossy name used for classification
    fn name(&self) -> String {
        self.file_name.to_string_lossy().into_owned()
    }

    fn into_entry(self, kind: EntryKind) -> Entry {
        Entry::new(self.file_name, self.path, kind, self.is_dir)
    }
}

/// Scan `target` one level deep (plus the immediate children of each folder)
/// and classify everything found. Read-only.
pub fn scan_tree(target: &Path) -> Result<Inventory, ScannerError> {
    debug!(path = ?target, "Scanning directory");

    let metadata = fs::metadata(target).map_err(|e| access_error(target, e))?;

    if !metadata.is_dir() {
        return Err(ScannerError::NotADirectory(target.to_path_buf()));
    }

    let mut folders = Vec::new();
    let mut foreign = Vec::new();

    for child in read_children(target)? {
        trace!(entry = ?child.path, "Examining entry");

        let name = child.name();

        if is_hidden(&name) {
            trace!(name = %name, "Hidden entry");
            foreign.push(foreign_entry(child, ForeignReason::Hidden));
            continue;
        }

        if !child.is_dir {
            trace!(name = %name, "Root-level file");
            foreign.push(ForeignEntry {
                entry: child.into_entry(EntryKind::RootFile),
                reason: ForeignReason::RootFile,
            });
            continue;
        }

        let (kind, entry_kind) = match SpecialTag::from_name(&name) {
            Some(tag) => (FolderKind::Special(tag), EntryKind::SpecialFolder(tag)),
            None => (FolderKind::Regular, EntryKind::RegularFolder),
        };

        debug!(name = %name, kind = ?kind, "Found folder");
        folders.push(scan_folder(child.into_entry(entry_kind), kind)?);
    }

    debug!(
        folders = folders.len(),
        foreign = foreign.len(),
        "Scan complete"
    );

    Ok(Inventory {
        root: target.to_path_buf(),
        folders,
        foreign,
    })
}

fn scan_folder(folder: Entry, kind: FolderKind) -> Result<FolderContents, ScannerError> {
    let mut audio = Vec::new();
    let mut foreign = Vec::new();

    for child in read_children(&folder.path)? {
        let name = child.name();

        let reason = if is_hidden(&name) {
            Some(ForeignReason::Hidden)
        } else if child.is_dir {
            Some(ForeignReason::NestedDirectory)
        } else if !is_audio_extension(&extension_of(&child.file_name)) {
            Some(ForeignReason::NotAudio)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                trace!(folder = %folder.name, name = %name, reason = ?reason, "Foreign entry");
                foreign.push(foreign_entry(child, reason));
            }
            None => audio.push(child.into_entry(EntryKind::Audio)),
        }
    }

    sort_natural(&mut audio, |e| e.name.as_str());

    debug!(
        folder = %folder.name,
        audio = audio.len(),
        foreign = foreign.len(),
        "Scanned folder"
    );

    Ok(FolderContents {
        folder,
        kind,
        audio,
        foreign,
    })
}

fn foreign_entry(child: Child, reason: ForeignReason) -> ForeignEntry {
    let kind = if reason == ForeignReason::RootFile {
        EntryKind::RootFile
    } else {
        EntryKind::Foreign
    };

    ForeignEntry {
        entry: child.into_entry(kind),
        reason,
    }
}

fn access_error(path: &Path, e: io::Error) -> ScannerError {
    match e.kind() {
        io::ErrorKind::NotFound => ScannerError::PathNotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => ScannerError::PermissionDenied(path.to_path_buf()),
        _ => ScannerError::IoError(e),
    }
}

/// List the immediate children of `dir`, sorted by raw name so that later
/// stable sorts do not depend on directory listing order.
fn read_children(dir: &Path) -> Result<Vec<Child>, ScannerError> {
    let read_dir = fs::read_dir(dir).map_err(|e| access_error(dir, e))?;

    let mut children = Vec::new();

    for entry in read_dir {
        let entry = entry?;
        // Symlinks are not followed and count as files.
        let is_dir = entry.file_type()?.is_dir();

        children.push(Child {
            file_name: entry.file_name(),
            path: entry.path(),
            is_dir,
        });
    }

    children.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(children)
}
