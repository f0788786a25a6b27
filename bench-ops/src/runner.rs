//! External process execution.
//!
//! Every command goes through `sh -c` with an explicit working directory.
//! The runner never changes the process-wide current directory and carries
//! no state between calls.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::OpsError;

/// Raw result of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout and stderr joined, trimmed, for error reports.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }

    fn into_result(self, command: &str) -> Result<String, OpsError> {
        if self.success() {
            return Ok(self.stdout);
        }
        Err(OpsError::ExternalCommandFailure {
            command: command.to_string(),
            exit_code: self.exit_code,
            output: self.combined(),
        })
    }
}

/// Outcome of handing the terminal over to a long-running program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// The program took over. With a real exec this is never observed
    /// in-process, since control does not come back.
    Replaced,
    Failed(String),
}

/// Seam between orchestration logic and the operating system.
///
/// Implementors supply [`ProcessRunner::output`] and [`ProcessRunner::exec`];
/// `run`, `capture`, `check` and `run_with_input` are derived from them.
pub trait ProcessRunner {
    /// Run `command` in `cwd`, optionally feeding `stdin`, and collect its
    /// output. Fails only when the shell cannot be spawned.
    fn output(&self, command: &str, cwd: &Path, stdin: Option<&str>)
        -> Result<CommandOutput, OpsError>;

    /// Replace the current process image with `program args…` in `cwd`.
    fn exec(&self, program: &Path, args: &[&str], cwd: &Path) -> Launch;

    /// Non-zero exit → `ExternalCommandFailure`.
    fn run(&self, command: &str, cwd: &Path) -> Result<(), OpsError> {
        tracing::debug!(cwd = %cwd.display(), "run: {command}");
        self.output(command, cwd, None)?.into_result(command).map(|_| ())
    }

    /// Like [`run`](ProcessRunner::run), returning stdout.
    fn capture(&self, command: &str, cwd: &Path) -> Result<String, OpsError> {
        tracing::debug!(cwd = %cwd.display(), "capture: {command}");
        self.output(command, cwd, None)?.into_result(command)
    }

    /// Like [`run`](ProcessRunner::run), but any failure is `false`.
    fn check(&self, command: &str, cwd: &Path) -> bool {
        tracing::debug!(cwd = %cwd.display(), "check: {command}");
        matches!(self.output(command, cwd, None), Ok(out) if out.success())
    }

    /// Like [`run`](ProcessRunner::run), with `input` written to stdin.
    fn run_with_input(&self, command: &str, cwd: &Path, input: &str) -> Result<(), OpsError> {
        tracing::debug!(cwd = %cwd.display(), "run (stdin {} bytes): {command}", input.len());
        self.output(command, cwd, Some(input))?
            .into_result(command)
            .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// ShellRunner
// ---------------------------------------------------------------------------

/// The real runner: `sh -c <command>`.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ProcessRunner for ShellRunner {
    fn output(
        &self,
        command: &str,
        cwd: &Path,
        stdin: Option<&str>,
    ) -> Result<CommandOutput, OpsError> {
        let spawn_err = |source| OpsError::Spawn {
            command: command.to_string(),
            source,
        };

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            // A child that exits early closes its end; its status says why.
            match pipe.write_all(input.as_bytes()) {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(spawn_err(e)),
                _ => {}
            }
        }

        let output = child.wait_with_output().map_err(spawn_err)?;
        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.stdout.trim().is_empty() {
            tracing::debug!("{}", result.stdout.trim_end());
        }
        if !result.stderr.trim().is_empty() {
            tracing::debug!("{}", result.stderr.trim_end());
        }
        Ok(result)
    }

    #[cfg(unix)]
    fn exec(&self, program: &Path, args: &[&str], cwd: &Path) -> Launch {
        use std::os::unix::process::CommandExt;

        tracing::info!("exec: {} {}", program.display(), args.join(" "));
        let err = Command::new(program).args(args).current_dir(cwd).exec();
        Launch::Failed(format!("exec {} failed: {err}", program.display()))
    }

    #[cfg(not(unix))]
    fn exec(&self, program: &Path, args: &[&str], cwd: &Path) -> Launch {
        tracing::info!("spawn: {} {}", program.display(), args.join(" "));
        match Command::new(program).args(args).current_dir(cwd).status() {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(err) => Launch::Failed(format!("spawn {} failed: {err}", program.display())),
        }
    }
}

// ---------------------------------------------------------------------------
// Program lookup
// ---------------------------------------------------------------------------

/// First candidate found as an executable file on `search_path`.
///
/// Candidates are tried in order; for each candidate every directory of the
/// search path is tried in order.
pub fn find_program(candidates: &[&str], search_path: Option<&OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    candidates.iter().find_map(|name| {
        std::env::split_paths(search_path)
            .map(|dir| dir.join(name))
            .find(|path| is_executable(path))
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
