//! `bench update`, `bench restart` and `bench start`

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;

use bench_ops::{Launch, Orchestrator, UpdateOptions};

/// With no step flag, every step runs.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// git pull every app.
    #[arg(long)]
    pub pull: bool,

    /// Reinstall each app's requirements.txt.
    #[arg(long)]
    pub requirements: bool,

    /// Migrate every site.
    #[arg(long)]
    pub patch: bool,

    /// Rebuild static assets.
    #[arg(long)]
    pub build: bool,

    /// Run as the scheduled auto-update; needs auto_update in config.json.
    #[arg(long)]
    pub auto: bool,

    /// Skip the supervisor restart even if configured.
    #[arg(long)]
    pub no_restart: bool,
}

impl UpdateArgs {
    pub fn run(self, bench: &Path) -> Result<()> {
        let options = UpdateOptions {
            pull: self.pull,
            requirements: self.requirements,
            patch: self.patch,
            build: self.build,
            auto: self.auto,
            no_restart: self.no_restart,
        };
        let report = Orchestrator::open(bench)?.update(&options)?;

        let steps = [
            ("pull", report.pulled),
            ("requirements", report.requirements),
            ("patch", report.patched),
            ("build", report.built),
            ("restart", report.restarted),
        ];
        let done: Vec<&str> = steps.iter().filter(|(_, ran)| *ran).map(|(n, _)| *n).collect();
        println!("✓ Updated ({})", done.join(", "));
        Ok(())
    }
}

pub fn restart(bench: &Path) -> Result<()> {
    Orchestrator::open(bench)?.restart_supervisor_processes()?;
    println!("✓ Restarted supervisor processes");
    Ok(())
}

pub fn start(bench: &Path) -> Result<()> {
    match Orchestrator::open(bench)?.start_process_manager()? {
        Launch::Replaced => Ok(()),
        Launch::Failed(reason) => bail!("failed to start process manager: {reason}"),
    }
}
