//! Process supervision: the sudoers grant for restarts and launching the
//! `Procfile` process manager.

use std::path::{Path, PathBuf};

use bench_renderer::SudoersContext;

use crate::bench::Orchestrator;
use crate::error::{io_err, OpsError};
use crate::runner::{find_program, Launch, ProcessRunner};

/// Candidates tried in order; the first found on `PATH` wins.
pub const PROCESS_MANAGERS: &[&str] = &["foreman", "forego", "honcho"];

pub const SUDOERS_DIR: &str = "/etc/sudoers.d";
pub const SUDOERS_FILE: &str = "frappe";
pub const SUDOERS_MODE: u32 = 0o440;

/// Grant `user` passwordless `supervisorctl restart frappe:` by writing
/// `<dir>/frappe`. Returns the written path.
pub fn setup_sudoers<R: ProcessRunner + ?Sized>(
    runner: &R,
    user: &str,
    dir: &Path,
) -> Result<PathBuf, OpsError> {
    tracing::info!("setting up sudoers");
    let supervisorctl = runner.capture("which supervisorctl", dir)?.trim().to_string();
    let ctx = SudoersContext {
        user: user.to_string(),
        supervisorctl,
    };
    let line = bench_renderer::Renderer::new()?.sudoers(&ctx)?;

    let path = dir.join(SUDOERS_FILE);
    std::fs::write(&path, format!("{}\n", line.trim_end())).map_err(|e| io_err(&path, e))?;
    set_mode(&path, SUDOERS_MODE)?;
    Ok(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), OpsError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), OpsError> {
    Ok(())
}

impl<R: ProcessRunner> Orchestrator<R> {
    /// Hand the terminal to the first process manager found on `PATH`.
    ///
    /// On success with a real runner this does not return; `Launch::Failed`
    /// means the manager was found but could not be executed.
    pub fn start_process_manager(&self) -> Result<Launch, OpsError> {
        let search_path = std::env::var_os("PATH");
        self.start_with_search_path(search_path.as_deref())
    }

    pub(crate) fn start_with_search_path(
        &self,
        search_path: Option<&std::ffi::OsStr>,
    ) -> Result<Launch, OpsError> {
        let program = find_program(PROCESS_MANAGERS, search_path).ok_or_else(|| {
            OpsError::NoProcessManager {
                tried: PROCESS_MANAGERS.join(", "),
            }
        })?;
        tracing::info!("starting {}", program.display());
        Ok(self.runner().exec(&program, &["start"], self.bench()))
    }
}
