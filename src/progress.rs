//! Progress output for user-facing status updates.
//!
//! In verbose mode output is suppressed since tracing handles everything.
//! In normal mode output is shown with colors while the tree is scanned,
//! cleaned and renamed.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// Progress reporter for user-facing output
pub struct Progress {
    writer: Box<dyn Write>,
    /// When true, all output is suppressed (verbose mode uses tracing instead)
    silent: bool,
    /// When true, output is colorized
    colors_enabled: bool,
}

/// Check if we should use colors in output
pub fn should_use_colors() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    io::stderr().is_terminal()
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Create a new progress reporter writing to stderr
    pub fn new() -> Self {
        Self {
            writer: Box::new(io::stderr()),
            silent: false,
            colors_enabled: should_use_colors(),
        }
    }

    /// Create a progress reporter that respects UI mode
    /// When verbose=true, output is suppressed (tracing handles it)
    pub fn new_with_ui(verbose: bool, colors_enabled: bool) -> Self {
        if !colors_enabled {
            colored::control::set_override(false);
        }
        Self {
            writer: Box::new(io::stderr()),
            silent: verbose,
            colors_enabled,
        }
    }

    /// Create a progress reporter with a custom writer (for testing)
    #[cfg(test)]
    pub fn with_writer(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            silent: false,
            colors_enabled: false,
        }
    }

    /// A reporter writing into a shared buffer (for testing)
    #[cfg(test)]
    pub(crate) fn captured() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<u8>>>) {
        let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let progress = Self::with_writer(Box::new(SharedBuffer(buffer.clone())));
        (progress, buffer)
    }

    /// Create a silent progress reporter
    pub fn silent() -> Self {
        Self {
            writer: Box::new(io::sink()),
            silent: true,
            colors_enabled: false,
        }
    }

    pub fn scan_start(&mut self, root: &Path) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let _ = writeln!(
                self.writer,
                "{}",
                format!("Scanning {}...", root.display()).dimmed()
            );
        } else {
            let _ = writeln!(self.writer, "Scanning {}...", root.display());
        }
    }

    pub fn scan_complete(&mut self, folders: usize, audio: usize, foreign: usize) {
        if self.silent {
            return;
        }
        let msg = format!(
            "Found {} folders, {} audio files, {} entries to remove",
            folders, audio, foreign
        );
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{}", msg.bold());
        } else {
            let _ = writeln!(self.writer, "{}", msg);
        }
    }

    /// Report progress on a single deletion
    pub fn cleanup_progress(&mut self, current: usize, total: usize, path: &Path) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let counter = format!("[{}/{}]", current, total);
            let _ = writeln!(
                self.writer,
                "{} {} {}",
                counter.cyan(),
                "delete".red(),
                path.display().to_string().dimmed()
            );
        } else {
            let _ = writeln!(
                self.writer,
                "[{}/{}] delete {}",
                current,
                total,
                path.display()
            );
        }
    }

    /// Report progress on a single rename
    pub fn rename_progress(&mut self, current: usize, total: usize, from: &str, to: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let counter = format!("[{}/{}]", current, total);
            let _ = writeln!(
                self.writer,
                "{} {} {} {}",
                counter.cyan(),
                from.dimmed(),
                "→".cyan(),
                to
            );
        } else {
            let _ = writeln!(self.writer, "[{}/{}] {} -> {}", current, total, from, to);
        }
    }

    /// Report a non-fatal problem
    pub fn warn(&mut self, message: &str) {
        if self.silent {
            return;
        }
        if self.colors_enabled {
            let _ = writeln!(self.writer, "{} {}", "!".yellow().bold(), message.yellow());
        } else {
            let _ = writeln!(self.writer, "Warning: {}", message);
        }
    }

    pub fn run_complete(&mut self, folders: usize, files: usize, dry_run: bool) {
        if self.silent {
            return;
        }
        let _ = writeln!(self.writer);
        if dry_run {
            let msg = format!(
                "Dry run complete. {} folders and {} files would be renamed.",
                folders, files
            );
            if self.colors_enabled {
                let _ = writeln!(self.writer, "{}", msg.dimmed());
            } else {
                let _ = writeln!(self.writer, "{}", msg);
            }
        } else if self.colors_enabled {
            let _ = writeln!(
                self.writer,
                "{} {}",
                "✓".green().bold(),
                format!("{} folders and {} files renamed", folders, files).green()
            );
        } else {
            let _ = writeln!(
                self.writer,
                "Done. {} folders and {} files renamed.",
                folders, files
            );
        }
    }
}

#[cfg(test)]
struct SharedBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
