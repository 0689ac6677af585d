//! Git helpers.
//!
//! Only ever stages files; committing is left to the operator.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

fn git_available() -> bool {
    which::which("git").is_ok()
}

/// Whether `dir` is inside a git work tree.
pub fn is_repository(dir: &Path) -> bool {
    if !git_available() {
        return false;
    }
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Stage `file` (relative to `dir`).
pub fn stage(dir: &Path, file: &str) -> Result<()> {
    let output = Command::new("git")
        .args(["add", "--", file])
        .current_dir(dir)
        .output()?;

    if !output.status.success() {
        return Err(Error::Other(format!(
            "git add {} failed: {}",
            file,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    debug!(file, "staged");
    Ok(())
}
