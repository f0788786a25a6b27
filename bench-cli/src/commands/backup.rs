//! `bench backup <site>` and `bench backup-all-sites`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use bench_ops::Orchestrator;

#[derive(Args, Debug)]
pub struct BackupArgs {
    pub site: String,
}

impl BackupArgs {
    pub fn run(self, bench: &Path) -> Result<()> {
        Orchestrator::open(bench)?
            .backup_site(&self.site)
            .with_context(|| format!("backup of '{}' failed", self.site))?;
        println!("✓ Backed up '{}'", self.site);
        Ok(())
    }
}

pub fn run_all(bench: &Path) -> Result<()> {
    let sites = Orchestrator::open(bench)?
        .backup_all_sites()
        .context("backup aborted; remaining sites were not backed up")?;
    println!("✓ Backed up {} site(s)", sites.len());
    Ok(())
}
