//! User crontab maintenance through the `crontab` program.
//!
//! Lines are appended only when no identical line is already installed, so
//! adding the same schedule twice leaves one entry.

use std::path::Path;

use crate::error::OpsError;
use crate::runner::ProcessRunner;

/// The current user's crontab; empty when none is installed.
///
/// `crontab -l` exits non-zero for a user with no crontab, which is not an
/// error here.
pub fn read_crontab<R: ProcessRunner + ?Sized>(runner: &R, cwd: &Path) -> String {
    runner.capture("crontab -l", cwd).unwrap_or_default()
}

pub fn has_line(crontab: &str, line: &str) -> bool {
    crontab.lines().any(|l| l.trim_end() == line)
}

/// Append `line` unless already present. Returns whether it was appended.
pub fn add_to_crontab<R: ProcessRunner + ?Sized>(
    runner: &R,
    cwd: &Path,
    line: &str,
) -> Result<bool, OpsError> {
    let current = read_crontab(runner, cwd);
    if has_line(&current, line) {
        tracing::debug!("crontab already has: {line}");
        return Ok(false);
    }

    let mut updated = current;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(line);
    updated.push('\n');

    runner.run_with_input("crontab -", cwd, &updated)?;
    tracing::info!("added to crontab: {line}");
    Ok(true)
}
