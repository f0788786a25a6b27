//! Site lifecycle and per-site configuration.

use bench_core::{config, sites, BenchError, ConfigMap, SiteName};
use serde_json::Value;

use crate::bench::Orchestrator;
use crate::error::OpsError;
use crate::runner::ProcessRunner;
use crate::shell::quote;

/// Interpret a command-line value: JSON literals (`true`, `8080`, `"x"`,
/// `{..}`) keep their type, anything else is taken as a plain string.
pub fn parse_config_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl<R: ProcessRunner> Orchestrator<R> {
    pub fn list_sites(&self) -> Result<Vec<SiteName>, OpsError> {
        Ok(sites::list_sites(self.bench())?)
    }

    /// Install a new site through the framework CLI. The first site of a
    /// bench becomes its default; returns whether that happened.
    pub fn new_site(
        &self,
        site: &str,
        mariadb_root_password: Option<&str>,
        admin_password: Option<&str>,
    ) -> Result<bool, OpsError> {
        tracing::info!("creating new site {site}");
        let site_q = quote(site);
        let mut args = format!("--install {site_q} {site_q}");
        if let Some(password) = mariadb_root_password {
            args.push_str(&format!(" --root_password {}", quote(password)));
        }
        if let Some(password) = admin_password {
            args.push_str(&format!(" --admin_password {}", quote(password)));
        }
        self.run_frappe(&args)?;

        if sites::is_sole_site(self.bench())? {
            tracing::info!("{site} is the only site; making it the default");
            self.run_frappe(&format!("--use {site_q}"))?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn set_default_site(&self, site: &str) -> Result<(), OpsError> {
        sites::require_site(self.bench(), site)?;
        self.run_frappe(&format!("--use {}", quote(site)))
    }

    /// Merge `partial` into the site's config, then regenerate the nginx
    /// config unless `regenerate` is false. Nothing is written for an
    /// unknown site.
    pub fn set_site_config_property(
        &self,
        site: &str,
        partial: ConfigMap,
        regenerate: bool,
    ) -> Result<ConfigMap, OpsError> {
        sites::require_site(self.bench(), site)?;
        let merged = config::update_site_config(self.bench(), site, partial)?;
        if regenerate {
            self.generate_nginx_config()?;
        }
        Ok(merged)
    }

    pub fn set_nginx_port(&self, site: &str, port: u16) -> Result<ConfigMap, OpsError> {
        self.set_site_config_property(site, config::entry("nginx_port", port), true)
    }

    pub fn set_ssl_certificate(&self, site: &str, path: &str) -> Result<ConfigMap, OpsError> {
        self.set_site_config_property(site, config::entry("ssl_certificate", path), true)
    }

    pub fn set_ssl_certificate_key(&self, site: &str, path: &str) -> Result<ConfigMap, OpsError> {
        self.set_site_config_property(site, config::entry("ssl_certificate_key", path), true)
    }

    /// Writes `host_name` as is; the site need not be registered yet.
    pub fn set_url_root(&self, site: &str, url: &str) -> Result<ConfigMap, OpsError> {
        Ok(config::update_site_config(
            self.bench(),
            site,
            config::entry("host_name", url),
        )?)
    }

    pub fn set_mariadb_host(&self, host: &str) -> Result<ConfigMap, OpsError> {
        Ok(config::update_common_site_config(
            self.bench(),
            config::entry("db_host", host),
        )?)
    }

    /// Set one `config.json` key. Known keys must keep their type.
    pub fn set_bench_config(&self, key: &str, raw: &str) -> Result<ConfigMap, OpsError> {
        let value = parse_config_value(raw);
        let mut candidate = config::get_config(self.bench())?;
        candidate.insert(key.to_string(), value.clone());
        bench_core::BenchConfig::from_map(candidate).map_err(|e| OpsError::InvalidConfigValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(config::update_config(self.bench(), config::entry(key, value))?)
    }

    /// One `config.json` value, or the whole mapping.
    pub fn get_bench_config(&self, key: Option<&str>) -> Result<Value, OpsError> {
        let map = config::get_config(self.bench())?;
        match key {
            None => Ok(Value::Object(map)),
            Some(key) => map.get(key).cloned().ok_or_else(|| {
                OpsError::Bench(BenchError::ConfigMissing {
                    key: key.to_string(),
                })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;
    use bench_core::paths;
    use serde_json::json;
    use tempfile::TempDir;

    fn bench_with_sites(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            std::fs::create_dir_all(paths::site_dir(dir.path(), name)).unwrap();
        }
        std::fs::create_dir_all(paths::config_dir(dir.path())).unwrap();
        dir
    }

    #[test]
    fn config_values_keep_json_types() {
        assert_eq!(parse_config_value("true"), json!(true));
        assert_eq!(parse_config_value("8080"), json!(8080));
        assert_eq!(parse_config_value("frappe"), json!("frappe"));
    }

    #[test]
    fn credentials_are_only_passed_when_given() {
        let dir = bench_with_sites(&[]);
        let o = Orchestrator::new(dir.path(), RecordingRunner::new()).unwrap();
        o.new_site("one.local", None, Some("admin")).unwrap();

        let install = &o.runner().commands()[0];
        assert!(install.ends_with("--install one.local one.local --admin_password admin"));
        assert!(!install.contains("--root_password"));
    }

    #[test]
    fn set_default_site_requires_membership() {
        let dir = bench_with_sites(&["a.local"]);
        let o = Orchestrator::new(dir.path(), RecordingRunner::new()).unwrap();
        assert!(matches!(
            o.set_default_site("b.local"),
            Err(OpsError::Bench(BenchError::NoSuchSite { .. }))
        ));
        o.set_default_site("a.local").unwrap();
        assert!(o.runner().commands()[0].ends_with("--use a.local"));
    }

    #[test]
    fn url_root_does_not_regenerate_nginx() {
        let dir = bench_with_sites(&["a.local"]);
        let o = Orchestrator::new(dir.path(), RecordingRunner::new()).unwrap();
        o.set_url_root("a.local", "https://a.example.com").unwrap();
        assert!(!paths::config_dir(dir.path()).join("nginx.conf").exists());
    }

    #[test]
    fn mistyped_known_key_is_rejected() {
        let dir = bench_with_sites(&[]);
        let o = Orchestrator::new(dir.path(), RecordingRunner::new()).unwrap();
        let err = o.set_bench_config("auto_update", "sometimes").unwrap_err();
        assert!(matches!(err, OpsError::InvalidConfigValue { .. }));
        assert!(!paths::config_path(dir.path()).exists());

        o.set_bench_config("auto_update", "true").unwrap();
        assert_eq!(o.get_bench_config(Some("auto_update")).unwrap(), json!(true));
    }
}
