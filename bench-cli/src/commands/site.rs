//! Site commands: `new-site`, `use`, `sites` and the per-site setters.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use bench_core::{config, sites};
use bench_ops::Orchestrator;

#[derive(Args, Debug)]
pub struct NewSiteArgs {
    pub site: String,

    #[arg(long, env = "MARIADB_ROOT_PASSWORD", hide_env_values = true)]
    pub mariadb_root_password: Option<String>,

    #[arg(long)]
    pub admin_password: Option<String>,
}

impl NewSiteArgs {
    pub fn run(self, bench: &Path) -> Result<()> {
        let o = Orchestrator::open(bench)?;
        let became_default = o
            .new_site(
                &self.site,
                self.mariadb_root_password.as_deref(),
                self.admin_password.as_deref(),
            )
            .with_context(|| format!("failed to create site '{}'", self.site))?;

        println!("✓ Created site '{}'", self.site);
        if became_default {
            println!("  '{}' is now the default site", self.site);
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct UseArgs {
    pub site: String,
}

impl UseArgs {
    pub fn run(self, bench: &Path) -> Result<()> {
        Orchestrator::open(bench)?.set_default_site(&self.site)?;
        println!("✓ Default site is now '{}'", self.site);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct SitesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct SiteRow {
    #[tabled(rename = "site")]
    name: String,
    #[tabled(rename = "host")]
    host_name: String,
    #[tabled(rename = "port")]
    port: String,
    #[tabled(rename = "default")]
    default: bool,
}

impl SitesArgs {
    pub fn run(self, bench: &Path) -> Result<()> {
        let default = sites::default_site(bench)?;
        let mut names = sites::list_sites(bench)?;
        names.sort_by(|a, b| a.0.cmp(&b.0));

        let mut rows = Vec::with_capacity(names.len());
        for name in names {
            let site_config = config::get_site_config(bench, name.as_ref())
                .with_context(|| format!("failed to read config of '{name}'"))?;
            let field = |key: &str| {
                site_config
                    .get(key)
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default()
            };
            rows.push(SiteRow {
                host_name: field("host_name"),
                port: field("nginx_port"),
                default: default.as_ref() == Some(&name),
                name: name.0,
            });
        }

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize sites")?
            );
            return Ok(());
        }

        if rows.is_empty() {
            println!("No sites yet. Run: bench new-site <site>");
            return Ok(());
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", "SITES".bold());
        println!("{table}");
        Ok(())
    }
}

/// `<site> <value>` pair shared by the string-valued setters.
#[derive(Args, Debug)]
pub struct SiteValueArgs {
    pub site: String,
    pub value: String,
}

impl SiteValueArgs {
    pub fn set_ssl_certificate(self, bench: &Path) -> Result<()> {
        Orchestrator::open(bench)?.set_ssl_certificate(&self.site, &self.value)?;
        self.report("ssl_certificate");
        Ok(())
    }

    pub fn set_ssl_certificate_key(self, bench: &Path) -> Result<()> {
        Orchestrator::open(bench)?.set_ssl_certificate_key(&self.site, &self.value)?;
        self.report("ssl_certificate_key");
        Ok(())
    }

    pub fn set_url_root(self, bench: &Path) -> Result<()> {
        Orchestrator::open(bench)?.set_url_root(&self.site, &self.value)?;
        self.report("host_name");
        Ok(())
    }

    fn report(&self, key: &str) {
        println!("✓ {}: {key} = {}", self.site, self.value);
    }
}

pub fn set_nginx_port(bench: &Path, site: &str, port: u16) -> Result<()> {
    Orchestrator::open(bench)?.set_nginx_port(site, port)?;
    println!("✓ {site}: nginx_port = {port}");
    Ok(())
}

pub fn set_mariadb_host(bench: &Path, host: &str) -> Result<()> {
    Orchestrator::open(bench)?.set_mariadb_host(host)?;
    println!("✓ db_host = {host}");
    Ok(())
}
