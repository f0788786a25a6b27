//! Site backups and the cron schedules that drive backups and auto-update.

use std::path::Path;

use bench_core::{paths, SiteName};

use crate::bench::Orchestrator;
use crate::crontab::add_to_crontab;
use crate::error::OpsError;
use crate::runner::ProcessRunner;
use crate::shell::{quote, quote_path};

/// Result of installing a cron schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Added,
    AlreadyPresent,
    /// Scheduling is switched off; the crontab was not touched.
    Disabled,
}

impl From<bool> for Schedule {
    fn from(added: bool) -> Self {
        if added {
            Schedule::Added
        } else {
            Schedule::AlreadyPresent
        }
    }
}

/// Every six hours, all sites, appended to `logs/backup.log`.
pub fn backup_cron_line(bench: &Path) -> String {
    format!(
        "0 */6 * * * cd {sites} &&  {frappe} --backup all >> {log} 2>&1",
        sites = quote_path(&paths::sites_dir(bench)),
        frappe = quote_path(&paths::framework_cli(bench)),
        log = quote_path(&paths::logs_dir(bench).join("backup.log")),
    )
}

/// Daily `bench update --auto`. Built for the log line only while
/// auto-update scheduling is off.
pub fn auto_update_cron_line(bench: &Path) -> String {
    format!(
        "0 10 * * * cd {dir} &&  {bench_bin} update --auto >> {log} 2>&1",
        dir = quote_path(bench),
        bench_bin = quote_path(&paths::env_bin(bench, "bench")),
        log = quote_path(&paths::logs_dir(bench).join("auto_update_log.log")),
    )
}

impl<R: ProcessRunner> Orchestrator<R> {
    pub fn backup_site(&self, site: &str) -> Result<(), OpsError> {
        tracing::info!("backing up {site}");
        self.run_frappe(&format!("--backup {}", quote(site)))
    }

    /// Back up every site in name order. The first failure aborts the
    /// batch; sites after it are not attempted.
    pub fn backup_all_sites(&self) -> Result<Vec<SiteName>, OpsError> {
        let mut sites = self.list_sites()?;
        sites.sort_by(|a, b| a.0.cmp(&b.0));
        for site in &sites {
            self.backup_site(site.as_ref())?;
        }
        Ok(sites)
    }

    pub fn setup_backups(&self) -> Result<Schedule, OpsError> {
        tracing::info!("setting up backups");
        let line = backup_cron_line(self.bench());
        Ok(add_to_crontab(self.runner(), self.bench(), &line)?.into())
    }

    /// Auto-update scheduling is disabled: nothing is installed.
    pub fn setup_auto_update(&self) -> Result<Schedule, OpsError> {
        tracing::info!("auto update scheduling is disabled; crontab left unchanged");
        tracing::debug!("skipped: {}", auto_update_cron_line(self.bench()));
        Ok(Schedule::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;

    #[test]
    fn backup_line_matches_cron_format() {
        let line = backup_cron_line(Path::new("/home/frappe/bench"));
        assert_eq!(
            line,
            "0 */6 * * * cd /home/frappe/bench/sites &&  /home/frappe/bench/env/bin/frappe \
             --backup all >> /home/frappe/bench/logs/backup.log 2>&1"
        );
    }

    #[test]
    fn auto_update_never_touches_crontab() {
        let o = Orchestrator::new("/srv/b", RecordingRunner::new()).unwrap();
        assert_eq!(o.setup_auto_update().unwrap(), Schedule::Disabled);
        assert!(o.runner().calls().is_empty());
    }

    #[test]
    fn second_backup_setup_reports_present() {
        let o = Orchestrator::new("/srv/b", RecordingRunner::new().with_crontab("")).unwrap();
        assert_eq!(o.setup_backups().unwrap(), Schedule::Added);
        assert_eq!(o.setup_backups().unwrap(), Schedule::AlreadyPresent);
        assert_eq!(o.runner().crontab().lines().count(), 1);
    }
}
