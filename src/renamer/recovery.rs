//! Entries left under temporary names by an interrupted run.
//!
//! A fresh scan sees staged entries as ordinary folders and audio files.
//! Planning gives each one the number embedded in its temporary name, so
//! they are only listed here.

use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use super::parse_temp_name;
use crate::scanner::Inventory;

/// An entry found under a temporary name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeftoverEntry {
    pub dir: PathBuf,
    pub name: String,
    pub target: String,
    pub is_folder: bool,
}

impl LeftoverEntry {
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// Every staged entry in `inventory`, files before folders
pub fn find_leftovers(inventory: &Inventory) -> Vec<LeftoverEntry> {
    let mut files = Vec::new();
    let mut folders = Vec::new();

    for folder in &inventory.folders {
        for file in &folder.audio {
            if let Some((_, target)) = parse_temp_name(&file.name) {
                files.push(LeftoverEntry {
                    dir: folder.folder.path.clone(),
                    name: file.name.clone(),
                    target: target.to_string(),
                    is_folder: false,
                });
            }
        }

        if let Some((_, target)) = parse_temp_name(folder.name()) {
            folders.push(LeftoverEntry {
                dir: inventory.root.clone(),
                name: folder.name().to_string(),
                target: target.to_string(),
                is_folder: true,
            });
        }
    }

    files.extend(folders);
    for entry in &files {
        debug!(path = ?entry.current_path(), target = %entry.target, "Staged entry");
    }
    files
}
