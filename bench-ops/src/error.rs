use std::path::PathBuf;

use thiserror::Error;

use bench_core::BenchError;
use bench_renderer::RenderError;

/// Error surface for every orchestration operation.
#[derive(Debug, Error)]
pub enum OpsError {
    #[error(transparent)]
    Bench(#[from] BenchError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The external command ran and exited non-zero (or was killed).
    #[error("command `{command}` failed ({}): {output}", exit_label(.exit_code))]
    ExternalCommandFailure {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// The shell itself could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown user '{name}'")]
    UnknownUser { name: String },

    #[error("unknown group '{name}'")]
    UnknownGroup { name: String },

    #[error("{op} failed: {source}")]
    Identity {
        op: &'static str,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("no process manager found (tried: {tried})")]
    NoProcessManager { tried: String },

    #[error("invalid apps manifest {location}: {message}")]
    Manifest { location: String, message: String },

    #[error("invalid value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    #[error("auto update is disabled; set auto_update in config.json to enable it")]
    AutoUpdateDisabled,
}

impl OpsError {
    /// Exit code of a failed external command, if that is what this is.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            OpsError::ExternalCommandFailure { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit status {c}"),
        None => "terminated by signal".to_string(),
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> OpsError {
    OpsError::Io {
        path: path.into(),
        source,
    }
}
