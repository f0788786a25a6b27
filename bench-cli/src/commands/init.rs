//! `bench init <path> [...]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bench_core::BenchConfig;
use bench_ops::identity::{Identity, SystemIdentity};
use bench_ops::{InitOptions, Orchestrator, ShellRunner};

/// Create a new bench directory.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to create. Must not exist yet.
    pub path: PathBuf,

    /// Apps manifest (JSON file or http(s) URL) installed after frappe.
    #[arg(long)]
    pub apps_path: Option<String>,

    #[arg(long)]
    pub no_procfile: bool,

    #[arg(long)]
    pub no_backups: bool,

    #[arg(long)]
    pub no_auto_update: bool,

    /// Repository to clone frappe from.
    #[arg(long, value_name = "URL")]
    pub frappe_path: Option<String>,

    #[arg(long, value_name = "BRANCH")]
    pub frappe_branch: Option<String>,

    /// Record a wheel cache directory and prime it.
    #[arg(long, value_name = "DIR")]
    pub wheel_cache_dir: Option<String>,

    /// Interpreter for the bench virtualenv.
    #[arg(long, env = "BENCH_PYTHON", default_value = "python")]
    pub python: String,

    /// Owner recorded as frappe_user. Defaults to the invoking user.
    #[arg(long)]
    pub user: Option<String>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let user = match self.user {
            Some(user) => user,
            None => SystemIdentity
                .current_user()
                .context("cannot determine the current user; pass --user")?,
        };

        let mut options = InitOptions::new(BenchConfig::seed(user));
        options.python = self.python;
        options.apps_path = self.apps_path;
        options.no_procfile = self.no_procfile;
        options.no_backups = self.no_backups;
        options.no_auto_update = self.no_auto_update;
        options.frappe_path = self.frappe_path;
        options.frappe_branch = self.frappe_branch;
        options.wheel_cache_dir = self.wheel_cache_dir;

        let bench = Orchestrator::init(&self.path, options, ShellRunner)
            .with_context(|| format!("failed to create bench at '{}'", self.path.display()))?;

        println!("✓ Bench created at {}", bench.bench().display());
        println!("  Next: cd {} && bench new-site <site>", self.path.display());
        Ok(())
    }
}
