//! In-memory doubles for the two OS seams, [`ProcessRunner`] and
//! [`Identity`]. They record every call so tests can assert ordering and
//! arguments without root, network or the framework installed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, OpsError};
use crate::identity::Identity;
use crate::runner::{CommandOutput, Launch, ProcessRunner};

// ---------------------------------------------------------------------------
// RecordingRunner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub command: String,
    pub cwd: PathBuf,
    pub stdin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCall {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// Records commands instead of running them.
///
/// - `crontab -l` / `crontab -` operate on an in-memory crontab.
/// - Commands containing a [`fail_on`](Self::fail_on) pattern exit with the
///   given code.
/// - Commands containing a [`respond`](Self::respond) pattern print the given
///   stdout.
/// - With [`with_framework_effects`](Self::with_framework_effects), the
///   framework CLI's `--install <site>` creates the site directory and
///   `--use <site>` writes `currentsite.txt`, both relative to the call's cwd.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<Call>>,
    launches: RefCell<Vec<LaunchCall>>,
    failures: Vec<(String, i32)>,
    responses: Vec<(String, String)>,
    crontab: RefCell<Option<String>>,
    framework_effects: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, pattern: impl Into<String>, exit_code: i32) -> Self {
        self.failures.push((pattern.into(), exit_code));
        self
    }

    pub fn respond(mut self, pattern: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.responses.push((pattern.into(), stdout.into()));
        self
    }

    pub fn with_crontab(self, contents: impl Into<String>) -> Self {
        *self.crontab.borrow_mut() = Some(contents.into());
        self
    }

    pub fn with_framework_effects(mut self) -> Self {
        self.framework_effects = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.command.clone()).collect()
    }

    /// Index of the first recorded command containing `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.calls
            .borrow()
            .iter()
            .position(|c| c.command.contains(pattern))
    }

    pub fn launches(&self) -> Vec<LaunchCall> {
        self.launches.borrow().clone()
    }

    pub fn crontab(&self) -> String {
        self.crontab.borrow().clone().unwrap_or_default()
    }

    fn apply_framework_effects(&self, command: &str, cwd: &Path) -> Result<(), OpsError> {
        let tokens: Vec<&str> = command.split_whitespace().collect();
        for pair in tokens.windows(2) {
            match pair[0] {
                "--install" => {
                    let dir = cwd.join(pair[1]);
                    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
                }
                "--use" => {
                    let marker = cwd.join("currentsite.txt");
                    std::fs::write(&marker, pair[1]).map_err(|e| io_err(&marker, e))?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput {
        exit_code: Some(0),
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

impl ProcessRunner for RecordingRunner {
    fn output(
        &self,
        command: &str,
        cwd: &Path,
        stdin: Option<&str>,
    ) -> Result<CommandOutput, OpsError> {
        self.calls.borrow_mut().push(Call {
            command: command.to_string(),
            cwd: cwd.to_path_buf(),
            stdin: stdin.map(str::to_string),
        });

        if let Some((_, code)) = self.failures.iter().find(|(p, _)| command.contains(p.as_str())) {
            return Ok(CommandOutput {
                exit_code: Some(*code),
                stdout: String::new(),
                stderr: format!("simulated failure: {command}"),
            });
        }

        match command {
            "crontab -l" => {
                return Ok(match self.crontab.borrow().as_ref() {
                    Some(tab) => ok(tab.clone()),
                    None => CommandOutput {
                        exit_code: Some(1),
                        stdout: String::new(),
                        stderr: "no crontab for user".to_string(),
                    },
                });
            }
            "crontab -" => {
                *self.crontab.borrow_mut() = Some(stdin.unwrap_or_default().to_string());
                return Ok(ok(""));
            }
            _ => {}
        }

        if self.framework_effects {
            self.apply_framework_effects(command, cwd)?;
        }

        let stdout = self
            .responses
            .iter()
            .find(|(p, _)| command.contains(p.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(ok(stdout))
    }

    fn exec(&self, program: &Path, args: &[&str], cwd: &Path) -> Launch {
        self.launches.borrow_mut().push(LaunchCall {
            program: program.to_path_buf(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: cwd.to_path_buf(),
        });
        Launch::Replaced
    }
}

// ---------------------------------------------------------------------------
// RecordingIdentity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOp {
    ClearGroups,
    SetGid(u32),
    SetUid(u32),
    Umask(u32),
    Chown { path: PathBuf, uid: u32, gid: u32 },
}

/// Identity backend with a fixed user / group table.
#[derive(Debug, Default)]
pub struct RecordingIdentity {
    privileged: bool,
    current_user: Option<String>,
    users: HashMap<String, u32>,
    groups: HashMap<String, u32>,
    ops: RefCell<Vec<IdentityOp>>,
}

impl RecordingIdentity {
    pub fn new(privileged: bool) -> Self {
        Self {
            privileged,
            ..Self::default()
        }
    }

    pub fn with_user(mut self, name: &str, uid: u32) -> Self {
        self.users.insert(name.to_string(), uid);
        self
    }

    pub fn with_group(mut self, name: &str, gid: u32) -> Self {
        self.groups.insert(name.to_string(), gid);
        self
    }

    pub fn with_current_user(mut self, name: &str) -> Self {
        self.current_user = Some(name.to_string());
        self
    }

    pub fn ops(&self) -> Vec<IdentityOp> {
        self.ops.borrow().clone()
    }
}

impl Identity for RecordingIdentity {
    fn is_privileged(&self) -> bool {
        self.privileged
    }

    fn current_user(&self) -> Option<String> {
        self.current_user.clone()
    }

    fn user_id(&self, name: &str) -> Result<u32, OpsError> {
        self.users
            .get(name)
            .copied()
            .ok_or_else(|| OpsError::UnknownUser {
                name: name.to_string(),
            })
    }

    fn group_id(&self, name: &str) -> Result<u32, OpsError> {
        self.groups
            .get(name)
            .copied()
            .ok_or_else(|| OpsError::UnknownGroup {
                name: name.to_string(),
            })
    }

    fn clear_groups(&self) -> Result<(), OpsError> {
        self.ops.borrow_mut().push(IdentityOp::ClearGroups);
        Ok(())
    }

    fn set_gid(&self, gid: u32) -> Result<(), OpsError> {
        self.ops.borrow_mut().push(IdentityOp::SetGid(gid));
        Ok(())
    }

    fn set_uid(&self, uid: u32) -> Result<(), OpsError> {
        self.ops.borrow_mut().push(IdentityOp::SetUid(uid));
        Ok(())
    }

    fn set_umask(&self, mask: u32) -> u32 {
        self.ops.borrow_mut().push(IdentityOp::Umask(mask));
        0o022
    }

    fn chown(&self, path: &Path, uid: u32, gid: u32) -> Result<(), OpsError> {
        self.ops.borrow_mut().push(IdentityOp::Chown {
            path: path.to_path_buf(),
            uid,
            gid,
        });
        Ok(())
    }
}
