//! [`Orchestrator`]: one bench directory plus the runner used to drive the
//! external tools. Operations live in the sibling modules as further
//! `impl` blocks.

use std::path::{Path, PathBuf};

use bench_core::{config, paths, types::BenchConfig};
use bench_renderer::Renderer;

use crate::error::{io_err, OpsError};
use crate::runner::{ProcessRunner, ShellRunner};
use crate::shell::quote_path;

pub struct Orchestrator<R: ProcessRunner = ShellRunner> {
    bench: PathBuf,
    runner: R,
}

impl Orchestrator<ShellRunner> {
    /// Orchestrator over `bench` driving real processes.
    pub fn open(bench: impl AsRef<Path>) -> Result<Self, OpsError> {
        Self::new(bench, ShellRunner)
    }
}

impl<R: ProcessRunner> Orchestrator<R> {
    /// `bench` is made absolute against the current directory once, here;
    /// every command after that gets an explicit absolute working directory.
    pub fn new(bench: impl AsRef<Path>, runner: R) -> Result<Self, OpsError> {
        let bench = bench.as_ref();
        let bench = if bench.is_absolute() {
            bench.to_path_buf()
        } else {
            let cwd = std::env::current_dir().map_err(|e| io_err(".", e))?;
            cwd.join(bench)
        };
        Ok(Self { bench, runner })
    }

    pub fn bench(&self) -> &Path {
        &self.bench
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn sites_dir(&self) -> PathBuf {
        paths::sites_dir(&self.bench)
    }

    pub fn config(&self) -> Result<BenchConfig, OpsError> {
        Ok(config::load_bench_config(&self.bench)?)
    }

    /// Renderer with this bench's `config/templates/` overrides.
    pub fn renderer(&self) -> Result<Renderer, OpsError> {
        let overrides = paths::config_dir(&self.bench).join("templates");
        Ok(Renderer::with_overrides(Some(&overrides))?)
    }

    /// Quoted path of the framework CLI. Logs how to install it when absent;
    /// the caller's command then fails on its own.
    pub(crate) fn frappe(&self) -> String {
        if !paths::framework_cli_installed(&self.bench) {
            tracing::warn!(
                "frappe app is not installed. Run `bench get-app frappe https://github.com/frappe/frappe.git`"
            );
        }
        quote_path(&paths::framework_cli(&self.bench))
    }

    /// `<frappe> <args>` with `sites/` as working directory.
    pub(crate) fn run_frappe(&self, args: &str) -> Result<(), OpsError> {
        let command = format!("{} {args}", self.frappe());
        self.runner.run(&command, &self.sites_dir())
    }

    /// Quoted path of a program inside the bench virtualenv.
    pub(crate) fn env_bin(&self, program: &str) -> String {
        quote_path(&paths::env_bin(&self.bench, program))
    }

    /// Write a generated file, mapping permission failures distinctly.
    pub(crate) fn write_file(&self, path: &Path, contents: &str) -> Result<(), OpsError> {
        std::fs::write(path, contents)
            .map_err(|e| OpsError::Bench(bench_core::error::io_err(path, e)))
    }
}
