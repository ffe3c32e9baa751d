//! Filesystem primitives used by the mutating stages (cleanup and rename).
//!
//! Scanning is read-only and talks to `std::fs` directly; everything that
//! changes the tree goes through [`Filesystem`] so tests can inject failures.

use std::fs;
use std::io;
use std::path::Path;

pub trait Filesystem {
    /// True if anything (file, directory or dangling symlink) occupies `path`
    fn exists(&self, path: &Path) -> bool;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl Filesystem for StdFs {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

/// Fails every rename after the first `allowed` ones
#[cfg(test)]
pub(crate) struct CrashingFs {
    allowed: std::cell::Cell<usize>,
}

#[cfg(test)]
impl CrashingFs {
    pub(crate) fn new(allowed: usize) -> Self {
        Self {
            allowed: std::cell::Cell::new(allowed),
        }
    }
}

#[cfg(test)]
impl Filesystem for CrashingFs {
    fn exists(&self, path: &Path) -> bool {
        StdFs.exists(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if self.allowed.get() == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated crash"));
        }
        self.allowed.set(self.allowed.get() - 1);
        StdFs.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        StdFs.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        StdFs.remove_dir_all(path)
    }
}
