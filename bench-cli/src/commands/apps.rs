//! `bench get-app <name> <url> [--branch B]`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use bench_ops::Orchestrator;

#[derive(Args, Debug)]
pub struct GetAppArgs {
    /// Directory name under apps/.
    pub name: String,

    /// Git repository to clone.
    pub url: String,

    #[arg(long)]
    pub branch: Option<String>,
}

impl GetAppArgs {
    pub fn run(self, bench: &Path) -> Result<()> {
        Orchestrator::open(bench)?
            .get_app(&self.name, &self.url, self.branch.as_deref())
            .with_context(|| format!("failed to get app '{}'", self.name))?;
        println!("✓ Installed app '{}'", self.name);
        Ok(())
    }
}
