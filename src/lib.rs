pub mod cleanup;
pub mod cli;
pub mod confirm;
pub mod engine;
pub mod error;
pub mod fs;
pub mod logging;
pub mod natural;
pub mod output;
pub mod plan;
pub mod progress;
pub mod renamer;
pub mod scanner;

pub use cleanup::{execute_cleanup, CleanupError, CleanupItem, CleanupPlan};
pub use confirm::{Answers, AutoConfirm, Confirm, TerminalPrompt};
pub use engine::{organize, EmptyFolderPolicy, RunOptions, RunOutcome};
pub use error::{AppError, ExitCode};
pub use fs::{Filesystem, StdFs};
pub use natural::{natural_cmp, sort_natural, NaturalKey};
pub use plan::{build_plan, FolderPlan, NameChange, NamingScheme, PlanError, RenamePlan};
pub use renamer::{
    find_leftovers, EntryState, ExecutionReport, LeftoverEntry, Phase, RenameError, StagedRename,
    Staging, TwoPhaseRenamer,
};
pub use scanner::{scan_tree, FolderKind, ForeignReason, Inventory, ScannerError, SpecialTag};
