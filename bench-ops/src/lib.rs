//! # bench-ops
//!
//! Orchestration of a bench: every high-level operation is a method on
//! [`Orchestrator`], a fixed sequence of external commands (through a
//! [`ProcessRunner`]) and JSON config updates. The first failure aborts the
//! rest of the sequence.
//!
//! Privilege handling lives in [`identity`], crontab edits in [`crontab`],
//! and log setup in [`logging`]. With the `testing` feature, `testing`
//! provides recording doubles for the runner and identity seams.

mod apps;
mod backup;
mod bench;
mod init;
mod nginx;
mod site;
mod supervisor;
mod update;

pub mod crontab;
pub mod error;
pub mod identity;
pub mod logging;
pub mod runner;
pub mod shell;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use apps::{git_supports_shallow, load_manifest, AppSpec};
pub use backup::{auto_update_cron_line, backup_cron_line, Schedule};
pub use bench::Orchestrator;
pub use error::OpsError;
pub use identity::{Identity, SystemIdentity};
pub use init::{InitOptions, DEFAULT_FRAMEWORK_URL};
pub use runner::{CommandOutput, Launch, ProcessRunner, ShellRunner};
pub use site::parse_config_value;
pub use supervisor::{setup_sudoers, PROCESS_MANAGERS, SUDOERS_DIR};
pub use update::{UpdateOptions, UpdateReport};
