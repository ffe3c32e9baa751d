use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::plan::{NameChange, RenamePlan};

/// Prefix of every temporary name. Final names are digits (plus an
/// extension) or a special folder name, so they never start with it.
pub const TEMP_PREFIX: &str = "__dftmp";

/// Temporary-name scheme for one run: `__dftmp<nonce>_<final name>`.
///
/// The nonce is explicit so a crashed run can be resumed with the same
/// temporary names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staging {
    nonce: u32,
}

/// One entry of the plan that changes name, with its temporary name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRename {
    /// Parent directory at the time the entry is renamed
    pub dir: PathBuf,
    pub current: OsString,
    pub temporary: String,
    pub target: String,
    pub is_folder: bool,
}

impl StagedRename {
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

impl Staging {
    pub fn new(nonce: u32) -> Self {
        Self { nonce }
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn temp_name(&self, target: &str) -> String {
        format!("{}{}_{}", TEMP_PREFIX, self.nonce, target)
    }

    /// Smallest nonce, starting at `seed`, whose temporary names are disjoint
    /// from every current and final name in `plan`.
    ///
    /// A taken name can only block the one nonce spelled inside it, so this
    /// tries at most one more nonce than there are names.
    pub fn for_plan(plan: &RenamePlan, seed: u32) -> Self {
        let taken: HashSet<String> = plan.all_names().map(|n| n.to_lowercase()).collect();

        let mut staging = Staging::new(seed);
        while !staging.is_disjoint(plan, &taken) {
            staging = Staging::new(staging.nonce.wrapping_add(1));
        }
        staging
    }

    /// Names are compared case-insensitively since FAT file systems are.
    fn is_disjoint(&self, plan: &RenamePlan, taken: &HashSet<String>) -> bool {
        staged_targets(plan).all(|target| !taken.contains(&self.temp_name(target).to_lowercase()))
    }

    /// Every entry that changes name: each folder's files in plan order,
    /// then the folders themselves
    pub fn stage(&self, plan: &RenamePlan) -> Vec<StagedRename> {
        let mut out = Vec::new();

        for folder in &plan.folders {
            let dir = plan.root.join(&folder.folder.current);
            out.extend(self.stage_changes(&dir, &folder.files, false));
        }

        let folders = plan.folders.iter().map(|f| &f.folder);
        out.extend(self.stage_changes(&plan.root, folders, true));

        out
    }

    fn stage_changes<'p>(
        &self,
        dir: &Path,
        changes: impl IntoIterator<Item = &'p NameChange>,
        is_folder: bool,
    ) -> Vec<StagedRename> {
        changes
            .into_iter()
            .filter(|c| !c.is_identity())
            .map(|c| StagedRename {
                dir: dir.to_path_buf(),
                current: c.current.clone(),
                temporary: self.temp_name(&c.target),
                target: c.target.clone(),
                is_folder,
            })
            .collect()
    }
}

/// Split a temporary name into its nonce and final name
pub fn parse_temp_name(name: &str) -> Option<(u32, &str)> {
    let rest = name.strip_prefix(TEMP_PREFIX)?;
    let (nonce, target) = rest.split_once('_')?;
    if nonce.is_empty() || target.is_empty() || !nonce.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((nonce.parse().ok()?, target))
}

fn staged_targets(plan: &RenamePlan) -> impl Iterator<Item = &str> {
    plan.folders.iter().flat_map(|f| {
        let folder = (!f.folder.is_identity()).then_some(f.folder.target.as_str());
        f.files
            .iter()
            .filter(|c| !c.is_identity())
            .map(|c| c.target.as_str())
            .chain(folder)
    })
}
