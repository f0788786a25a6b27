//! `bench fix-perms [--user U]`

use std::path::Path;

use anyhow::Result;
use clap::Args;

use bench_ops::identity::{self, SystemIdentity};

#[derive(Args, Debug)]
pub struct FixPermsArgs {
    /// Owner to apply. Defaults to frappe_user from config.json.
    #[arg(long)]
    pub user: Option<String>,
}

impl FixPermsArgs {
    pub fn run(self, bench: &Path) -> Result<()> {
        let changed = identity::fix_file_perms(&SystemIdentity, bench, self.user.as_deref())?;
        if changed.is_empty() {
            println!("No log or service files to fix.");
        }
        for path in changed {
            println!("✓ {}", path.display());
        }
        Ok(())
    }
}
