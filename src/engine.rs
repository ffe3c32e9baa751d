//! End-to-end run: scan, plan, confirm, clean up, rename.
//!
//! Everything that can fail before a mutation (an invalid root, a capacity
//! overflow) fails before the first confirmation. Both gates are passed
//! before the first deletion.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::cleanup::{execute_cleanup, CleanupPlan};
use crate::confirm::Confirm;
use crate::error::AppError;
use crate::fs::Filesystem;
use crate::plan::{build_plan, RenamePlan};
use crate::progress::Progress;
use crate::renamer::{find_leftovers, ExecutionReport, LeftoverEntry, Staging, TwoPhaseRenamer};
use crate::scanner::{scan_tree, Inventory};

/// What to do with regular folders that contain no audio files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyFolderPolicy {
    /// Number them like any other folder
    #[default]
    Keep,
    /// Delete them with the other foreign entries
    Remove,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub empty_folders: EmptyFolderPolicy,
    /// First nonce tried for temporary names
    pub nonce_seed: u32,
}

#[derive(Debug)]
pub struct RunOutcome {
    /// Entries found under temporary names from an earlier run. The plan
    /// gives each one the number it was staged for.
    pub leftovers: Vec<LeftoverEntry>,
    pub cleanup: CleanupPlan,
    pub plan: RenamePlan,
    pub removed: usize,
    /// `None` for a dry run
    pub report: Option<ExecutionReport>,
    pub dry_run: bool,
}

/// Organize the SD card rooted at `root`.
///
/// With `dry_run` set the tree is only scanned and planned. Otherwise
/// `confirm` is asked before anything is deleted and before anything is
/// renamed; a declined gate returns [`AppError::ConfirmationDeclined`].
///
/// A tree left half-renamed by an interrupted run is planned like any
/// other, and the plan finishes the interrupted renames.
pub fn organize<F, C>(
    root: &Path,
    options: &RunOptions,
    fs: &F,
    confirm: &mut C,
    progress: &mut Progress,
) -> Result<RunOutcome, AppError>
where
    F: Filesystem,
    C: Confirm + ?Sized,
{
    progress.scan_start(root);
    let mut inventory = scan_tree(root)?;

    let leftovers = find_leftovers(&inventory);
    if !leftovers.is_empty() {
        warn!(count = leftovers.len(), "Found entries staged by an interrupted run");
        progress.warn(&format!(
            "{} entries were left under temporary names by an interrupted run",
            leftovers.len()
        ));
    }

    apply_empty_folder_policy(&mut inventory, options.empty_folders, progress);

    let cleanup = CleanupPlan::from_inventory(&inventory);
    progress.scan_complete(inventory.folders.len(), inventory.audio_count(), cleanup.len());

    let plan = build_plan(&inventory)?;
    info!(
        folders = plan.folder_count(),
        files = plan.file_count(),
        folder_changes = plan.folder_changes(),
        file_changes = plan.file_changes(),
        deletions = cleanup.len(),
        "Plan built"
    );

    let mut outcome = RunOutcome {
        leftovers,
        cleanup,
        plan,
        removed: 0,
        report: None,
        dry_run: options.dry_run,
    };

    if options.dry_run {
        debug!("Dry run, nothing is modified");
        return Ok(outcome);
    }

    if !outcome.cleanup.is_empty() && !confirm.confirm_cleanup(&outcome.cleanup) {
        return Err(declined("deletion of foreign entries"));
    }

    if !outcome.plan.is_noop() && !confirm.confirm_renames(&outcome.plan) {
        return Err(declined("rename plan"));
    }

    outcome.removed = execute_cleanup(&outcome.cleanup, fs, progress)?;

    let staging = Staging::for_plan(&outcome.plan, options.nonce_seed);
    let report = TwoPhaseRenamer::new(fs, staging).execute(&outcome.plan, progress)?;
    outcome.report = Some(report);

    Ok(outcome)
}

fn apply_empty_folder_policy(
    inventory: &mut Inventory,
    policy: EmptyFolderPolicy,
    progress: &mut Progress,
) {
    match policy {
        EmptyFolderPolicy::Keep => {
            for folder in inventory.empty_folders() {
                warn!(folder = %folder.name(), "Folder contains no audio files");
                progress.warn(&format!(
                    "'{}' contains no audio files, numbering it anyway",
                    folder.name()
                ));
            }
        }
        EmptyFolderPolicy::Remove => {
            let pruned = inventory.prune_empty_folders();
            if pruned > 0 {
                info!(count = pruned, "Empty folders will be removed");
            }
        }
    }
}

fn declined(stage: &str) -> AppError {
    info!(stage = %stage, "Confirmation declined");
    AppError::ConfirmationDeclined {
        stage: stage.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::{Answers, AutoConfirm};
    use crate::error::ExitCode;
    use crate::fs::{CrashingFs, StdFs};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Relative path -> file content (`None` for directories), recursively
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Option<Vec<u8>>>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                if path.is_dir() {
                    out.insert(rel, None);
                    walk(root, &path, out);
                } else {
                    out.insert(rel, Some(fs::read(&path).unwrap()));
                }
            }
        }

        let mut out = BTreeMap::new();
        walk(root, root, &mut out);
        out
    }

    fn setup_card() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for folder in ["Rock", "Jazz", "Classical"] {
            fs::create_dir(root.join(folder)).unwrap();
        }
        fs::write(root.join("Rock").join("Track 10.mp3"), "r10").unwrap();
        fs::write(root.join("Rock").join("Track 2.mp3"), "r2").unwrap();
        fs::write(root.join("Rock").join("cover.jpg"), "img").unwrap();
        fs::write(root.join("Jazz").join("Song.MP3"), "j").unwrap();
        fs::write(root.join("Classical").join("a.wav"), "c").unwrap();
        fs::write(root.join("readme.txt"), "txt").unwrap();
        fs::create_dir(root.join(".Spotlight-V100")).unwrap();
        dir
    }

    #[test]
    fn test_full_run() {
        let dir = setup_card();
        let root = dir.path();

        let outcome = organize(
            root,
            &RunOptions::default(),
            &StdFs,
            &mut AutoConfirm,
            &mut Progress::silent(),
        )
        .unwrap();

        assert_eq!(outcome.removed, 3);
        let report = outcome.report.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.folders_renamed(), 3);

        assert!(!root.join("readme.txt").exists());
        assert!(!root.join(".Spotlight-V100").exists());
        assert_eq!(fs::read_to_string(root.join("01").join("001.wav")).unwrap(), "c");
        assert_eq!(fs::read_to_string(root.join("02").join("001.mp3")).unwrap(), "j");
        assert_eq!(fs::read_to_string(root.join("03").join("001.mp3")).unwrap(), "r2");
        assert_eq!(fs::read_to_string(root.join("03").join("002.mp3")).unwrap(), "r10");
        assert!(!root.join("03").join("cover.jpg").exists());
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let dir = setup_card();
        let options = RunOptions::default();
        organize(dir.path(), &options, &StdFs, &mut AutoConfirm, &mut Progress::silent()).unwrap();
        let before = snapshot(dir.path());

        // Declining would fail if either gate were asked
        let outcome = organize(
            dir.path(),
            &options,
            &StdFs,
            &mut Answers::all(false),
            &mut Progress::silent(),
        )
        .unwrap();

        assert!(outcome.plan.is_noop());
        assert!(outcome.cleanup.is_empty());
        assert_eq!(snapshot(dir.path()), before);
    }

    #[test]
    fn test_declining_cleanup_leaves_tree_unchanged() {
        let dir = setup_card();
        let before = snapshot(dir.path());

        let err = organize(
            dir.path(),
            &RunOptions::default(),
            &StdFs,
            &mut Answers::all(false),
            &mut Progress::silent(),
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), ExitCode::ConfirmationDeclined);
        assert_eq!(snapshot(dir.path()), before);
    }

    #[test]
    fn test_declining_renames_deletes_nothing() {
        let dir = setup_card();
        let before = snapshot(dir.path());

        let mut answers = Answers {
            cleanup: true,
            renames: false,
        };
        let err = organize(
            dir.path(),
            &RunOptions::default(),
            &StdFs,
            &mut answers,
            &mut Progress::silent(),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::ConfirmationDeclined { .. }));
        assert_eq!(snapshot(dir.path()), before);
    }

    #[test]
    fn test_too_many_folders_fails_before_any_change() {
        let dir = tempdir().unwrap();
        for i in 0..100 {
            let folder = dir.path().join(format!("Album {}", i));
            fs::create_dir(&folder).unwrap();
            fs::write(folder.join("a.mp3"), "x").unwrap();
        }
        fs::write(dir.path().join("junk.txt"), "junk").unwrap();
        let before = snapshot(dir.path());

        let err = organize(
            dir.path(),
            &RunOptions::default(),
            &StdFs,
            &mut AutoConfirm,
            &mut Progress::silent(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::CapacityExceeded {
                folder: None,
                count: 100,
                max: 99
            }
        ));
        assert_eq!(snapshot(dir.path()), before);
    }

    #[test]
    fn test_dry_run_plans_without_changes() {
        let dir = setup_card();
        let before = snapshot(dir.path());

        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };
        let outcome = organize(
            dir.path(),
            &options,
            &StdFs,
            &mut Answers::all(false),
            &mut Progress::silent(),
        )
        .unwrap();

        assert!(outcome.dry_run);
        assert!(outcome.report.is_none());
        assert_eq!(outcome.cleanup.len(), 3);
        assert_eq!(outcome.plan.folder_count(), 3);
        assert_eq!(snapshot(dir.path()), before);
    }

    #[test]
    fn test_empty_folder_policy() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Empty")).unwrap();
        fs::create_dir(dir.path().join("Full")).unwrap();
        fs::write(dir.path().join("Full").join("a.mp3"), "a").unwrap();

        let options = RunOptions {
            empty_folders: EmptyFolderPolicy::Remove,
            ..Default::default()
        };
        organize(dir.path(), &options, &StdFs, &mut AutoConfirm, &mut Progress::silent()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["01"]);
        assert!(dir.path().join("01").join("001.mp3").exists());
    }

    #[test]
    fn test_empty_folder_kept_by_default() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("Empty")).unwrap();
        fs::create_dir(dir.path().join("Full")).unwrap();
        fs::write(dir.path().join("Full").join("a.mp3"), "a").unwrap();

        organize(
            dir.path(),
            &RunOptions::default(),
            &StdFs,
            &mut AutoConfirm,
            &mut Progress::silent(),
        )
        .unwrap();

        assert!(dir.path().join("01").is_dir());
        assert!(dir.path().join("02").join("001.mp3").exists());
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_rerun_after_crash_keeps_track_order() {
        // "005 bonus.mp3" sorts before "005.mp3", so five tracks move up by
        // one: ten renames in total, with the folder already named "01".
        let tracks: Vec<(String, String)> = (1..=8)
            .map(|i| (format!("{:03}.mp3", i), format!("t{}", i)))
            .chain(std::iter::once(("005 bonus.mp3".to_string(), "bonus".to_string())))
            .collect();
        let expected = [
            "t1", "t2", "t3", "t4", "bonus", "t5", "t6", "t7", "t8",
        ];

        for allowed in 0..10 {
            let dir = tempdir().unwrap();
            let folder = dir.path().join("01");
            fs::create_dir(&folder).unwrap();
            for (name, content) in &tracks {
                fs::write(folder.join(name), content).unwrap();
            }

            let crashed = organize(
                dir.path(),
                &RunOptions::default(),
                &CrashingFs::new(allowed),
                &mut AutoConfirm,
                &mut Progress::silent(),
            );
            assert!(
                matches!(crashed, Err(AppError::RenameFailure { .. })),
                "expected a failure after {allowed} renames"
            );

            let outcome = organize(
                dir.path(),
                &RunOptions::default(),
                &StdFs,
                &mut AutoConfirm,
                &mut Progress::silent(),
            )
            .unwrap();
            assert!(outcome.report.unwrap().is_complete());

            let mut names: Vec<_> = fs::read_dir(&folder)
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect();
            names.sort();
            assert_eq!(names.len(), 9, "crash after {allowed}: {names:?}");
            for (i, content) in expected.iter().enumerate() {
                let name = format!("{:03}.mp3", i + 1);
                assert_eq!(
                    read(&folder.join(&name)),
                    *content,
                    "crash after {allowed}: {name}"
                );
            }
        }
    }

    #[test]
    fn test_staged_folder_is_finished_in_place() {
        // Folder renames stopped after "A" became "01"; "B" is still staged
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("01")).unwrap();
        fs::create_dir(root.join("__dftmp0_02")).unwrap();
        fs::write(root.join("01").join("001.mp3"), "a").unwrap();
        fs::write(root.join("__dftmp0_02").join("001.mp3"), "b").unwrap();

        let outcome = organize(
            root,
            &RunOptions::default(),
            &StdFs,
            &mut AutoConfirm,
            &mut Progress::silent(),
        )
        .unwrap();

        assert_eq!(outcome.leftovers.len(), 1);
        assert_eq!(outcome.plan.folder_changes(), 1);
        assert_eq!(outcome.plan.file_changes(), 0);
        assert_eq!(read(&root.join("01").join("001.mp3")), "a");
        assert_eq!(read(&root.join("02").join("001.mp3")), "b");
    }

    #[test]
    fn test_capacity_error_with_leftovers_changes_nothing() {
        let dir = tempdir().unwrap();
        for i in 0..99 {
            let folder = dir.path().join(format!("Album {}", i));
            fs::create_dir(&folder).unwrap();
            fs::write(folder.join("a.mp3"), "x").unwrap();
        }
        let staged = dir.path().join("__dftmp0_07");
        fs::create_dir(&staged).unwrap();
        fs::write(staged.join("__dftmp0_001.mp3"), "y").unwrap();
        let before = snapshot(dir.path());

        let err = organize(
            dir.path(),
            &RunOptions::default(),
            &StdFs,
            &mut AutoConfirm,
            &mut Progress::silent(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            AppError::CapacityExceeded { count: 100, .. }
        ));
        assert_eq!(snapshot(dir.path()), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_audio_is_renamed_not_deleted() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let folder = dir.path().join("Rock");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join(OsStr::from_bytes(b"Caf\xe9 Song.mp3")), "cafe").unwrap();
        fs::write(folder.join("b.mp3"), "b").unwrap();

        let outcome = organize(
            dir.path(),
            &RunOptions::default(),
            &StdFs,
            &mut AutoConfirm,
            &mut Progress::silent(),
        )
        .unwrap();

        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.report.unwrap().files_renamed(), 2);
        assert_eq!(read(&dir.path().join("01").join("001.mp3")), "b");
        assert_eq!(read(&dir.path().join("01").join("002.mp3")), "cafe");
    }
}
