//! Log setup: stderr for the operator, `logs/bench.log` for the record.
//!
//! The file layer opens `bench.log` lazily on the first event, so a bench
//! created by `init` starts logging to its own file as soon as `logs/`
//! exists. Before opening, the file is rotated by size:
//! `bench.log` → `bench.log.1` → … → `bench.log.5`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bench_core::paths;

/// Size at which `bench.log` is rotated (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Rotated generations kept.
pub const MAX_ROTATED_FILES: usize = 5;

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
/// A second call is a no-op.
pub fn init_logging(bench: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(BenchLogFile::new(paths::bench_log_path(bench)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}

// ---------------------------------------------------------------------------
// Lazy file writer
// ---------------------------------------------------------------------------

/// Appends to a log file once its directory exists; discards until then.
pub struct BenchLogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl BenchLogFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: Mutex::new(None),
        }
    }

    fn open(&self) -> io::Result<Option<File>> {
        if !self.path.parent().is_some_and(Path::exists) {
            return Ok(None);
        }
        rotate_if_needed(&self.path, MAX_LOG_BYTES, MAX_ROTATED_FILES)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map(Some)
    }
}

impl Write for &BenchLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut slot = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        if slot.is_none() {
            *slot = self.open()?;
        }
        match slot.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.lock() {
            Ok(mut slot) => slot.as_mut().map_or(Ok(()), |f| f.flush()),
            Err(_) => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for BenchLogFile {
    type Writer = &'a BenchLogFile;

    fn make_writer(&'a self) -> Self::Writer {
        self
    }
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Rotate `log_path` when it has reached `max_bytes`.
///
/// The oldest generation (`.max_files`) is deleted, each `.n` moves to
/// `.n+1`, and the live file becomes `.1`. Returns whether rotation
/// happened; a missing file is not an error.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes {
        return Ok(false);
    }

    let oldest = generation(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..max_files).rev() {
        let src = generation(log_path, n);
        if src.exists() {
            fs::rename(&src, generation(log_path, n + 1))?;
        }
    }
    fs::rename(log_path, generation(log_path, 1))?;
    Ok(true)
}

fn generation(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(paths::BENCH_LOG);
    base.with_file_name(format!("{name}.{n}"))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
