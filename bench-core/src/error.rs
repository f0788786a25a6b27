//! Error types for bench-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from bench layout, config and site operations.
#[derive(Debug, Error)]
pub enum BenchError {
    /// `init` target already exists on disk.
    #[error("directory {path} already exists")]
    AlreadyExists { path: PathBuf },

    /// Site name is not a directory under `sites/`.
    #[error("no such site '{site}'")]
    NoSuchSite { site: String },

    /// A config key an operation depends on has not been recorded.
    #[error("'{key}' is not configured")]
    ConfigMissing { key: String },

    /// No owning user given on the command line nor in `config.json`.
    #[error("frappe user not set")]
    UserNotConfigured,

    /// An existing JSON file could not be parsed (or is not an object).
    #[error("corrupt JSON at {path}: {source}")]
    DataCorruption {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Destination not writable (or not readable) by the current user.
    #[error("permission denied at {path}: {source}")]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Map an I/O error at `path`, splitting out permission failures.
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BenchError {
    let path = path.into();
    if source.kind() == std::io::ErrorKind::PermissionDenied {
        BenchError::Permission { path, source }
    } else {
        BenchError::Io { path, source }
    }
}
