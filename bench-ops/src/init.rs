//! Bench creation: directory tree, virtualenv, default config, framework app
//! and the optional extras (`Procfile`, cron schedules, additional apps).

use std::path::{Path, PathBuf};

use bench_core::{config, paths, types::BenchConfig, BenchError, ConfigMap};

use crate::bench::Orchestrator;
use crate::error::OpsError;
use crate::runner::ProcessRunner;
use crate::shell::{quote, quote_path};

/// Framework repository fetched when `init` is not given one.
pub const DEFAULT_FRAMEWORK_URL: &str = "https://github.com/indictranstech/phr-frappe.git";

/// Patched MySQL driver installed into every new virtualenv.
pub const MYSQLDB_ARCHIVE: &str =
    "https://github.com/frappe/MySQLdb1/archive/MySQLdb-1.2.5-patched.tar.gz";

/// Everything `init` needs, built by the caller up front.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Written verbatim as the new `config.json`.
    pub config: BenchConfig,
    /// Interpreter the virtualenv is created for.
    pub python: String,
    /// Apps manifest (file path or URL) installed after the framework.
    pub apps_path: Option<String>,
    pub no_procfile: bool,
    pub no_backups: bool,
    pub no_auto_update: bool,
    pub frappe_path: Option<String>,
    pub frappe_branch: Option<String>,
    pub wheel_cache_dir: Option<String>,
}

impl InitOptions {
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config,
            python: "python".to_string(),
            apps_path: None,
            no_procfile: false,
            no_backups: false,
            no_auto_update: false,
            frappe_path: None,
            frappe_branch: None,
            wheel_cache_dir: None,
        }
    }
}

impl<R: ProcessRunner> Orchestrator<R> {
    /// Create a bench at `path` and return an orchestrator over it.
    ///
    /// Fails with `AlreadyExists` before touching the filesystem if `path`
    /// exists. Any later failure aborts the remaining steps; the partially
    /// built bench is left in place for inspection.
    pub fn init(path: impl AsRef<Path>, options: InitOptions, runner: R) -> Result<Self, OpsError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(BenchError::AlreadyExists {
                path: path.to_path_buf(),
            }
            .into());
        }

        let bench = Self::new(path, runner)?;
        bench.create_tree()?;
        tracing::info!("creating bench at {}", bench.bench().display());

        bench.setup_env(&options.python)?;
        config::put_config(bench.bench(), &options.config.to_map().map_err(BenchError::from)?)?;
        config::put(&paths::common_site_config_path(bench.bench()), &ConfigMap::new())?;

        if let Some(dir) = &options.wheel_cache_dir {
            config::update_config(bench.bench(), config::entry("wheel_cache_dir", dir.as_str()))?;
            bench.prime_wheel_cache()?;
        }

        let frappe_url = options
            .frappe_path
            .as_deref()
            .unwrap_or(DEFAULT_FRAMEWORK_URL);
        bench.get_app("frappe", frappe_url, options.frappe_branch.as_deref())?;

        if !options.no_procfile {
            bench.setup_procfile()?;
        }
        if !options.no_backups {
            bench.setup_backups()?;
        }
        if !options.no_auto_update {
            bench.setup_auto_update()?;
        }
        if let Some(manifest) = &options.apps_path {
            bench.install_apps_from_path(manifest)?;
        }
        Ok(bench)
    }

    fn create_tree(&self) -> Result<(), OpsError> {
        let root = self.bench();
        std::fs::create_dir_all(root).map_err(|e| bench_core::error::io_err(root, e))?;
        for name in paths::BENCH_SUBDIRS {
            let dir = root.join(name);
            std::fs::create_dir(&dir).map_err(|e| bench_core::error::io_err(&dir, e))?;
        }
        Ok(())
    }

    /// Create `env/` and install the packaging baseline into it.
    pub fn setup_env(&self, python: &str) -> Result<(), OpsError> {
        tracing::info!("setting up virtualenv");
        let root = self.bench();
        self.runner()
            .run(&format!("virtualenv -q env -p {}", quote(python)), root)?;
        self.runner().run("./env/bin/pip -q install wheel", root)?;
        self.runner().run(
            &format!("./env/bin/pip -q install {}", quote(MYSQLDB_ARCHIVE)),
            root,
        )?;
        Ok(())
    }

    /// Build wheels for the cached requirement set into `wheel_cache_dir`.
    pub fn prime_wheel_cache(&self) -> Result<PathBuf, OpsError> {
        let cache_dir = self.config()?.wheel_cache_dir.ok_or_else(|| {
            BenchError::ConfigMissing {
                key: "wheel_cache_dir".to_string(),
            }
        })?;

        let requirements = paths::config_dir(self.bench()).join("cached_requirements.txt");
        self.write_file(&requirements, &self.renderer()?.cached_requirements()?)?;

        tracing::info!("priming wheel cache at {cache_dir}");
        let wheelhouse = quote(&cache_dir);
        let command = format!(
            "{pip} wheel --find-links {wheelhouse} --wheel-dir {wheelhouse} -r {req}",
            pip = self.env_bin("pip"),
            req = quote_path(&requirements),
        );
        self.runner().run(&command, self.bench())?;
        Ok(requirements)
    }

    /// Write the three-process `Procfile`.
    pub fn setup_procfile(&self) -> Result<PathBuf, OpsError> {
        let path = paths::procfile_path(self.bench());
        let contents = self.renderer()?.procfile()?;
        self.write_file(&path, &format!("{}\n", contents.trim_end()))?;
        tracing::info!("wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;
    use tempfile::TempDir;

    #[test]
    fn prime_wheel_cache_without_dir_is_config_missing() {
        let dir = TempDir::new().unwrap();
        let o = Orchestrator::new(dir.path(), RecordingRunner::new()).unwrap();
        let err = o.prime_wheel_cache().unwrap_err();
        assert!(matches!(
            err,
            OpsError::Bench(BenchError::ConfigMissing { ref key }) if key == "wheel_cache_dir"
        ));
        assert!(o.runner().calls().is_empty());
    }

    #[test]
    fn prime_wheel_cache_runs_pip_wheel() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(paths::config_dir(dir.path())).unwrap();
        config::put_config(dir.path(), &config::entry("wheel_cache_dir", "/var/cache/wheels"))
            .unwrap();
        let o = Orchestrator::new(dir.path(), RecordingRunner::new()).unwrap();

        let req = o.prime_wheel_cache().unwrap();
        assert!(req.exists());
        let cmd = &o.runner().commands()[0];
        assert!(cmd.contains(" wheel --find-links /var/cache/wheels --wheel-dir /var/cache/wheels -r "));
    }

    #[test]
    fn setup_env_runs_three_steps_in_bench() {
        let dir = TempDir::new().unwrap();
        let o = Orchestrator::new(dir.path(), RecordingRunner::new()).unwrap();
        o.setup_env("python2.7").unwrap();
        let calls = o.runner().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].command, "virtualenv -q env -p python2.7");
        assert!(calls.iter().all(|c| c.cwd == dir.path()));
    }
}
