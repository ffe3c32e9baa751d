//! Deletion plan for everything the scanner classified as foreign.
//!
//! Building the plan never touches the filesystem. `execute_cleanup` is a
//! separate call that the engine makes only after confirmation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::fs::Filesystem;
use crate::progress::Progress;
use crate::scanner::{ForeignReason, Inventory};

#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("Failed to remove '{}': {source}", .path.display())]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupItem {
    pub path: PathBuf,
    pub reason: ForeignReason,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupPlan {
    pub items: Vec<CleanupItem>,
}

impl CleanupPlan {
    pub fn from_inventory(inventory: &Inventory) -> Self {
        let items = inventory
            .all_foreign()
            .map(|f| CleanupItem {
                path: f.entry.path.clone(),
                reason: f.reason,
                is_dir: f.entry.is_dir,
            })
            .collect();

        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of items per reason, in a stable order
    pub fn counts_by_reason(&self) -> Vec<(ForeignReason, usize)> {
        let mut counts: BTreeMap<&'static str, (ForeignReason, usize)> = BTreeMap::new();
        for item in &self.items {
            counts
                .entry(item.reason.description())
                .or_insert((item.reason, 0))
                .1 += 1;
        }
        counts.into_values().collect()
    }

    /// One-paragraph summary shown before asking for confirmation
    pub fn summary(&self) -> String {
        if self.items.is_empty() {
            return String::from("Nothing to delete.");
        }

        let dirs = self.items.iter().filter(|i| i.is_dir).count();
        let files = self.items.len() - dirs;

        let mut msg = format!(
            "{} entries will be deleted ({} files, {} directories):\n",
            self.items.len(),
            files,
            dirs
        );
        for (reason, count) in self.counts_by_reason() {
            msg.push_str(&format!("  - {}: {}\n", reason, count));
        }
        msg
    }
}

/// Delete every item in the plan. Entries that are already gone are skipped.
pub fn execute_cleanup(
    plan: &CleanupPlan,
    fs: &impl Filesystem,
    progress: &mut Progress,
) -> Result<usize, CleanupError> {
    let total = plan.len();
    let mut removed = 0;

    for (i, item) in plan.items.iter().enumerate() {
        progress.cleanup_progress(i + 1, total, &item.path);

        let result = if item.is_dir {
            fs.remove_dir_all(&item.path)
        } else {
            fs.remove_file(&item.path)
        };

        match result {
            Ok(()) => {
                info!(path = ?item.path, reason = ?item.reason, "Removed");
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = ?item.path, "Already removed");
            }
            Err(e) => {
                return Err(CleanupError::RemoveFailed {
                    path: item.path.clone(),
                    source: e,
                })
            }
        }
    }

    Ok(removed)
}
