//! `bench config get [key]` and `bench config set <key> <value>`

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;

use bench_ops::Orchestrator;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print one key, or the whole config.json.
    Get { key: Option<String> },

    /// Set a key. JSON literals (true, 8000, "text") keep their type.
    Set { key: String, value: String },
}

pub fn run(bench: &Path, cmd: ConfigCommand) -> Result<()> {
    let o = Orchestrator::open(bench)?;
    match cmd {
        ConfigCommand::Get { key } => {
            let value = o.get_bench_config(key.as_deref())?;
            let rendered = match value {
                serde_json::Value::String(s) => s,
                other => serde_json::to_string_pretty(&other).context("failed to render value")?,
            };
            println!("{rendered}");
        }
        ConfigCommand::Set { key, value } => {
            let merged = o.set_bench_config(&key, &value)?;
            let stored = merged.get(&key).cloned().unwrap_or_default();
            println!("✓ {key} = {stored}");
        }
    }
    Ok(())
}
