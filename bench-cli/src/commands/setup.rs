//! `bench setup ...` and `bench prime-wheel-cache`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use bench_ops::{setup_sudoers, Orchestrator, Schedule, ShellRunner, SUDOERS_DIR};

#[derive(Subcommand, Debug)]
pub enum SetupCommand {
    /// Create the virtualenv.
    Env {
        #[arg(long, env = "BENCH_PYTHON", default_value = "python")]
        python: String,
    },

    /// Write the Procfile.
    Procfile,

    /// Schedule six-hourly backups in the user's crontab.
    Backups,

    /// Schedule daily auto-update (currently disabled).
    AutoUpdate,

    /// Generate config/nginx.conf from the site configs.
    Nginx,

    /// Let <user> restart frappe processes through supervisorctl.
    Sudoers {
        user: String,

        #[arg(long, default_value = SUDOERS_DIR)]
        dir: PathBuf,
    },
}

pub fn run(bench: &Path, cmd: SetupCommand) -> Result<()> {
    match cmd {
        SetupCommand::Sudoers { user, dir } => {
            let path = setup_sudoers(&ShellRunner, &user, &dir)
                .with_context(|| format!("failed to write sudoers entry in {}", dir.display()))?;
            println!("✓ Wrote {}", path.display());
        }
        SetupCommand::Env { python } => {
            Orchestrator::open(bench)?.setup_env(&python)?;
            println!("✓ Virtualenv ready");
        }
        SetupCommand::Procfile => {
            let path = Orchestrator::open(bench)?.setup_procfile()?;
            println!("✓ Wrote {}", path.display());
        }
        SetupCommand::Backups => {
            report_schedule("backups", Orchestrator::open(bench)?.setup_backups()?)
        }
        SetupCommand::AutoUpdate => {
            report_schedule("auto update", Orchestrator::open(bench)?.setup_auto_update()?)
        }
        SetupCommand::Nginx => {
            let path = Orchestrator::open(bench)?.generate_nginx_config()?;
            println!("✓ Wrote {}", path.display());
        }
    }
    Ok(())
}

fn report_schedule(what: &str, schedule: Schedule) {
    match schedule {
        Schedule::Added => println!("✓ Scheduled {what}"),
        Schedule::AlreadyPresent => println!("✓ {what} already scheduled"),
        Schedule::Disabled => println!("{what} scheduling is disabled; crontab unchanged"),
    }
}

pub fn prime_wheel_cache(bench: &Path) -> Result<()> {
    let requirements = Orchestrator::open(bench)?.prime_wheel_cache()?;
    println!("✓ Wheel cache primed from {}", requirements.display());
    Ok(())
}
