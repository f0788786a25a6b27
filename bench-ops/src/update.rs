//! `bench update`: pull, requirements, patch and build, then restart.

use crate::bench::Orchestrator;
use crate::error::OpsError;
use crate::runner::ProcessRunner;

/// Which update steps to run. With no step selected, all of them run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub pull: bool,
    pub requirements: bool,
    pub patch: bool,
    pub build: bool,
    /// Invoked from cron; refused unless `auto_update` is set.
    pub auto: bool,
    pub no_restart: bool,
}

impl UpdateOptions {
    fn all_steps(&self) -> bool {
        !(self.pull || self.requirements || self.patch || self.build)
    }
}

/// Steps actually performed by [`Orchestrator::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub pulled: bool,
    pub requirements: bool,
    pub patched: bool,
    pub built: bool,
    pub restarted: bool,
}

impl<R: ProcessRunner> Orchestrator<R> {
    pub fn update(&self, options: &UpdateOptions) -> Result<UpdateReport, OpsError> {
        let config = self.config()?;
        if options.auto && !config.auto_update {
            return Err(OpsError::AutoUpdateDisabled);
        }
        if config.update_bench_on_update {
            tracing::info!("skipping self-update; install a newer bench binary to upgrade");
        }

        let all = options.all_steps();
        let mut report = UpdateReport::default();

        if all || options.pull {
            self.pull_all_apps()?;
            report.pulled = true;
        }
        if all || options.requirements {
            self.update_requirements()?;
            report.requirements = true;
        }
        if all || options.patch {
            self.patch_sites()?;
            report.patched = true;
        }
        if all || options.build {
            self.build_assets()?;
            report.built = true;
        }
        if config.restart_supervisor_on_update && !options.no_restart {
            self.restart_supervisor_processes()?;
            report.restarted = true;
        }
        Ok(report)
    }

    /// Run pending migrations on every site.
    pub fn patch_sites(&self) -> Result<(), OpsError> {
        tracing::info!("patching sites");
        self.run_frappe("--latest all")
    }

    pub fn build_assets(&self) -> Result<(), OpsError> {
        tracing::info!("building assets");
        self.run_frappe("--build")
    }

    pub fn restart_supervisor_processes(&self) -> Result<(), OpsError> {
        let config = self.config()?;
        let command = config.supervisor_restart_cmd();
        tracing::info!("restarting processes: {command}");
        self.runner().run(command, self.bench())
    }
}
