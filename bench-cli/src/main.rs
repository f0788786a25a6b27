//! Bench: provision and operate a multi-site frappe installation.
//!
//! # Usage
//!
//! ```text
//! bench init <path> [--apps-path P] [--no-procfile] [--no-backups] [--no-auto-update]
//!                   [--frappe-path URL] [--frappe-branch B] [--wheel-cache-dir D]
//! bench new-site <site> [--mariadb-root-password P] [--admin-password P]
//! bench use <site>
//! bench sites [--json]
//! bench get-app <name> <url> [--branch B]
//! bench backup <site> | bench backup-all-sites
//! bench update [--pull] [--requirements] [--patch] [--build] [--auto] [--no-restart]
//! bench restart | bench start
//! bench set-nginx-port <site> <port> | set-ssl-certificate <site> <path>
//!       | set-ssl-key <site> <path> | set-url-root <site> <url> | set-mariadb-host <host>
//! bench config get [key] | config set <key> <value>
//! bench setup env|procfile|backups|auto-update|nginx|sudoers <user>
//! bench prime-wheel-cache | bench fix-perms [--user U]
//! ```

mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bench_ops::identity::{self, SystemIdentity};
use bench_ops::logging;

use commands::{
    apps::GetAppArgs,
    backup::BackupArgs,
    config::ConfigCommand,
    init::InitArgs,
    perms::FixPermsArgs,
    process::UpdateArgs,
    setup::SetupCommand,
    site::{NewSiteArgs, SiteValueArgs, SitesArgs, UseArgs},
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "bench",
    version,
    about = "Set up and manage frappe benches and their sites",
    long_about = None,
)]
struct Cli {
    /// Bench directory to operate on.
    #[arg(long, global = true, env = "BENCH_PATH", default_value = ".")]
    bench: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new bench directory.
    Init(InitArgs),

    /// Install a new site.
    NewSite(NewSiteArgs),

    /// Make a site the default.
    Use(UseArgs),

    /// List the sites of this bench.
    Sites(SitesArgs),

    /// Clone an app into apps/ and install it.
    GetApp(GetAppArgs),

    /// Back up one site.
    Backup(BackupArgs),

    /// Back up every site, stopping at the first failure.
    BackupAllSites,

    /// Pull apps, update requirements, patch sites and build assets.
    Update(UpdateArgs),

    /// Restart supervisor processes.
    Restart,

    /// Start the Procfile processes with foreman, forego or honcho.
    Start,

    /// Set the nginx port of a site.
    SetNginxPort {
        site: String,
        port: u16,
    },

    /// Set the TLS certificate path of a site.
    SetSslCertificate(SiteValueArgs),

    /// Set the TLS certificate key path of a site.
    SetSslKey(SiteValueArgs),

    /// Set the host name a site is served under.
    SetUrlRoot(SiteValueArgs),

    /// Set the database host for every site.
    SetMariadbHost {
        host: String,
    },

    /// Read or change config.json.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate environment, schedules and service files.
    Setup {
        #[command(subcommand)]
        command: SetupCommand,
    },

    /// Build wheels for the cached requirements into wheel_cache_dir.
    PrimeWheelCache,

    /// Give log and service config files back to the frappe user.
    FixPerms(FixPermsArgs),
}

impl Commands {
    /// Commands that need root keep it; everything else runs as frappe_user.
    fn keeps_privileges(&self) -> bool {
        matches!(
            self,
            Commands::Init(_)
                | Commands::Start
                | Commands::FixPerms(_)
                | Commands::Setup {
                    command: SetupCommand::Sudoers { .. }
                }
        )
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_root = match &cli.command {
        Commands::Init(args) => args.path.clone(),
        _ => cli.bench.clone(),
    };
    logging::init_logging(&log_root);

    if !cli.command.keeps_privileges() {
        drop_to_frappe_user(&cli.bench)?;
    }

    let bench = cli.bench.as_path();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::NewSite(args) => args.run(bench),
        Commands::Use(args) => args.run(bench),
        Commands::Sites(args) => args.run(bench),
        Commands::GetApp(args) => args.run(bench),
        Commands::Backup(args) => args.run(bench),
        Commands::BackupAllSites => commands::backup::run_all(bench),
        Commands::Update(args) => args.run(bench),
        Commands::Restart => commands::process::restart(bench),
        Commands::Start => commands::process::start(bench),
        Commands::SetNginxPort { site, port } => commands::site::set_nginx_port(bench, &site, port),
        Commands::SetSslCertificate(args) => args.set_ssl_certificate(bench),
        Commands::SetSslKey(args) => args.set_ssl_certificate_key(bench),
        Commands::SetUrlRoot(args) => args.set_url_root(bench),
        Commands::SetMariadbHost { host } => commands::site::set_mariadb_host(bench, &host),
        Commands::Config { command } => commands::config::run(bench, command),
        Commands::Setup { command } => commands::setup::run(bench, command),
        Commands::PrimeWheelCache => commands::setup::prime_wheel_cache(bench),
        Commands::FixPerms(args) => args.run(bench),
    }
}

/// As root, become the bench's `frappe_user` before touching anything.
fn drop_to_frappe_user(bench: &Path) -> Result<()> {
    identity::drop_to_bench_user(&SystemIdentity, bench)
        .with_context(|| format!("cannot drop root privileges for bench '{}'", bench.display()))?;
    Ok(())
}
