mod types;

pub use types::*;

use crate::natural::sort_natural;
use crate::renamer::parse_temp_name;
use crate::scanner::{FolderContents, FolderKind, Inventory};
use tracing::{debug, info, warn};

/// Compute the final name of every accepted folder and audio file.
///
/// Capacity is checked for the whole inventory before any name is produced,
/// so an error here means nothing has been planned, let alone renamed.
pub fn build_plan(inventory: &Inventory) -> Result<RenamePlan, PlanError> {
    let regular: Vec<&FolderContents> = inventory.regular_folders().collect();
    let mut special: Vec<&FolderContents> = inventory.special_folders().collect();

    check_capacity(&regular, &special)?;

    let regular = numbering_order(regular, |f| f.name(), |f| pinned_number(f.name(), None));
    special.sort_by_key(|f| match f.kind {
        FolderKind::Special(tag) => Some(tag),
        FolderKind::Regular => None,
    });

    let mut folders = Vec::with_capacity(regular.len() + special.len());

    for (i, contents) in regular.iter().enumerate() {
        let target = folder_name(i + 1);
        debug!(from = %contents.name(), to = %target, "Planned folder");
        folders.push(plan_folder(contents, target));
    }

    for contents in special {
        folders.push(plan_folder(contents, contents.name().to_string()));
    }

    let plan = RenamePlan {
        root: inventory.root.clone(),
        folders,
    };

    info!(
        folders = plan.folder_count(),
        files = plan.file_count(),
        "Rename plan built"
    );

    Ok(plan)
}

fn check_capacity(
    regular: &[&FolderContents],
    special: &[&FolderContents],
) -> Result<(), PlanError> {
    if regular.len() > MAX_REGULAR_FOLDERS {
        warn!(count = regular.len(), "Too many folders");
        return Err(PlanError::TooManyFolders {
            count: regular.len(),
            max: MAX_REGULAR_FOLDERS,
        });
    }

    for contents in regular.iter().chain(special.iter()) {
        let scheme = NamingScheme::for_kind(contents.kind);
        if contents.audio.len() > scheme.max_files {
            warn!(folder = %contents.name(), count = contents.audio.len(), "Too many files");
            return Err(PlanError::TooManyFiles {
                folder: contents.name().to_string(),
                count: contents.audio.len(),
                max: scheme.max_files,
            });
        }
    }

    Ok(())
}

fn plan_folder(contents: &FolderContents, target: String) -> FolderPlan {
    let scheme = NamingScheme::for_kind(contents.kind);

    let audio = numbering_order(
        contents.audio.iter().collect(),
        |e| e.name.as_str(),
        |e| pinned_number(&e.name, Some(&e.extension)),
    );

    let files = audio
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            NameChange::new(
                entry.file_name.clone(),
                scheme.file_name(i + 1, &entry.extension),
            )
        })
        .collect();

    FolderPlan {
        kind: contents.kind,
        folder: NameChange::new(contents.folder.file_name.clone(), target),
        files,
    }
}

/// Order `items` for numbering.
///
/// An entry staged by an interrupted run takes back the number embedded in
/// its temporary name. Everything else fills the free numbers in natural
/// order, which reproduces the interrupted plan whichever phase it stopped in.
fn numbering_order<T>(
    mut items: Vec<T>,
    name: impl Fn(&T) -> &str,
    pin: impl Fn(&T) -> Option<usize>,
) -> Vec<T> {
    sort_natural(&mut items, &name);

    let mut slots: Vec<Option<T>> = items.iter().map(|_| None).collect();
    let mut rest = Vec::new();

    for item in items {
        match pin(&item) {
            Some(n) if (1..=slots.len()).contains(&n) && slots[n - 1].is_none() => {
                debug!(name = %name(&item), number = n, "Staged entry keeps its number");
                slots[n - 1] = Some(item);
            }
            _ => rest.push(item),
        }
    }

    let mut rest = rest.into_iter();
    slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| rest.next()))
        .collect()
}

/// The number a temporary name was staged for. Only canonical final names
/// count; a file must also keep its extension.
fn pinned_number(name: &str, extension: Option<&str>) -> Option<usize> {
    let (_, target) = parse_temp_name(name)?;
    let stem = match extension {
        Some(ext) => {
            let (stem, target_ext) = target.rsplit_once('.')?;
            if target_ext != ext {
                return None;
            }
            stem
        }
        None => target,
    };

    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}
