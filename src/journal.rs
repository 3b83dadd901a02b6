//! Append-only, timestamped text records in the temp directory.
//!
//! Two journals exist: the activity log written by `logActiveWindow`
//! (name and title of the active window, for writing ignore rules) and the
//! crash record the daemon writes before exiting on a fatal error.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Login name used in the per-user file names.
fn user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// `$TMPDIR/xtiler_<user>.log`
pub fn default_activity_log() -> PathBuf {
    std::env::temp_dir().join(format!("xtiler_{}.log", user()))
}

/// `$TMPDIR/xtiler_crash_<user>.log`
pub fn default_crash_log() -> PathBuf {
    std::env::temp_dir().join(format!("xtiler_crash_{}.log", user()))
}

/// A text file that lines are appended to, each prefixed with the local
/// date and time.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `[<date> <time>] <message>` and a newline.
    pub fn append(&self, message: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let stamp = Local::now().format("%x %X");
        writeln!(file, "[{}] {}", stamp, message)
    }
}
