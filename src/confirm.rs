//! Confirmation gates in front of every destructive stage.

use colored::Colorize;
use std::io::{self, Write};

use crate::cleanup::CleanupPlan;
use crate::output::{display_cleanup_plan, display_rename_plan};
use crate::plan::RenamePlan;

/// Asked before anything on disk changes. Returning `false` aborts the run
/// with nothing modified by that stage.
pub trait Confirm {
    fn confirm_cleanup(&mut self, plan: &CleanupPlan) -> bool;

    fn confirm_renames(&mut self, plan: &RenamePlan) -> bool;
}

/// Accepts everything (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm_cleanup(&mut self, _plan: &CleanupPlan) -> bool {
        true
    }

    fn confirm_renames(&mut self, _plan: &RenamePlan) -> bool {
        true
    }
}

/// Fixed answers, for driving the engine without a terminal
#[derive(Debug, Clone, Copy)]
pub struct Answers {
    pub cleanup: bool,
    pub renames: bool,
}

impl Answers {
    pub fn all(answer: bool) -> Self {
        Self {
            cleanup: answer,
            renames: answer,
        }
    }
}

impl Confirm for Answers {
    fn confirm_cleanup(&mut self, _plan: &CleanupPlan) -> bool {
        self.cleanup
    }

    fn confirm_renames(&mut self, _plan: &RenamePlan) -> bool {
        self.renames
    }
}

/// Shows what is about to happen on stdout and reads `y/N` from stdin.
/// Anything but `y` or `yes` declines, including read errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn ask(&self, question: &str) -> bool {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "\n{} ", format!("{} [y/N]:", question).magenta());
        if stdout.flush().is_err() {
            return false;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(_) => is_yes(&input),
            Err(_) => false,
        }
    }
}

impl Confirm for TerminalPrompt {
    fn confirm_cleanup(&mut self, plan: &CleanupPlan) -> bool {
        if display_cleanup_plan(plan, &mut io::stdout()).is_err() {
            return false;
        }
        self.ask("Delete these entries?")
    }

    fn confirm_renames(&mut self, plan: &RenamePlan) -> bool {
        if display_rename_plan(plan, &mut io::stdout()).is_err() {
            return false;
        }
        self.ask("Apply these renames?")
    }
}

fn is_yes(input: &str) -> bool {
    let answer = input.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}
