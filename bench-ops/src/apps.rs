//! App checkouts under `apps/`: clone, editable install, pull and
//! requirement refresh.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use bench_core::paths;

use crate::bench::Orchestrator;
use crate::error::{io_err, OpsError};
use crate::runner::ProcessRunner;
use crate::shell::{quote, quote_path};

/// One entry of an apps manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppSpec {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Parse `git --version` output; shallow clones need 1.9 or newer.
pub fn git_supports_shallow(version_output: &str) -> bool {
    let Some(version) = version_output
        .split_whitespace()
        .find(|w| w.chars().next().is_some_and(|c| c.is_ascii_digit()))
    else {
        return false;
    };
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    major > 1 || (major == 1 && minor >= 9)
}

/// Read an apps manifest from a local file or an `http(s)://` URL.
pub fn load_manifest(location: &str) -> Result<Vec<AppSpec>, OpsError> {
    let manifest_err = |message: String| OpsError::Manifest {
        location: location.to_string(),
        message,
    };

    if location.starts_with("http://") || location.starts_with("https://") {
        let response = ureq::get(location)
            .call()
            .map_err(|e| manifest_err(e.to_string()))?;
        return response
            .into_json::<Vec<AppSpec>>()
            .map_err(|e| manifest_err(e.to_string()));
    }

    let raw = std::fs::read_to_string(location).map_err(|e| io_err(location, e))?;
    serde_json::from_str(&raw).map_err(|e| manifest_err(e.to_string()))
}

impl<R: ProcessRunner> Orchestrator<R> {
    pub fn apps_dir(&self) -> PathBuf {
        paths::apps_dir(self.bench())
    }

    /// Every directory under `apps/`, sorted by name.
    pub fn list_apps(&self) -> Result<Vec<PathBuf>, OpsError> {
        let dir = self.apps_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&dir, e)),
        };
        let mut apps = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_err(&dir, e))?.path();
            if path.is_dir() {
                apps.push(path);
            }
        }
        apps.sort();
        Ok(apps)
    }

    fn shallow_clone(&self) -> Result<bool, OpsError> {
        if !self.config()?.shallow_clone {
            return Ok(false);
        }
        let version = self
            .runner()
            .capture("git --version", self.bench())
            .unwrap_or_default();
        let supported = git_supports_shallow(&version);
        if !supported {
            tracing::info!("git is older than 1.9; cloning full history");
        }
        Ok(supported)
    }

    /// Clone `url` into `apps/<name>` and install it into the virtualenv.
    pub fn get_app(&self, name: &str, url: &str, branch: Option<&str>) -> Result<(), OpsError> {
        tracing::info!("getting app {name}");
        let mut command = format!("git clone {}", quote(url));
        if let Some(branch) = branch {
            command.push_str(&format!(" --branch {}", quote(branch)));
        }
        if self.shallow_clone()? {
            command.push_str(" --depth 1");
        }
        command.push_str(&format!(" --origin upstream {}", quote(name)));
        self.runner().run(&command, &self.apps_dir())?;

        tracing::info!("installing {name}");
        let install = format!(
            "{} install -q -e {}",
            self.env_bin("pip"),
            quote_path(&Path::new("apps").join(name)),
        );
        self.runner().run(&install, self.bench())
    }

    /// Fetch every app named in the manifest at `location`, in order.
    pub fn install_apps_from_path(&self, location: &str) -> Result<Vec<AppSpec>, OpsError> {
        let apps = load_manifest(location)?;
        for app in &apps {
            self.get_app(&app.name, &app.url, app.branch.as_deref())?;
        }
        Ok(apps)
    }

    /// `git pull [--rebase] upstream` in every app that is a git checkout.
    pub fn pull_all_apps(&self) -> Result<(), OpsError> {
        let rebase = if self.config()?.rebase_on_pull { " --rebase" } else { "" };
        for app in self.list_apps()? {
            if !app.join(".git").exists() {
                continue;
            }
            tracing::info!("pulling {}", app.display());
            self.runner()
                .run(&format!("git pull{rebase} upstream"), &app)?;
        }
        Ok(())
    }

    /// Install `requirements.txt` of every app that has one.
    pub fn update_requirements(&self) -> Result<(), OpsError> {
        tracing::info!("updating python packages");
        let pip = self.env_bin("pip");
        for app in self.list_apps()? {
            let requirements = app.join("requirements.txt");
            if !requirements.exists() {
                continue;
            }
            let command = format!("{pip} install -q -r {}", quote_path(&requirements));
            self.runner().run(&command, self.bench())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingRunner;
    use rstest::rstest;

    #[rstest]
    #[case("git version 2.39.2", true)]
    #[case("git version 1.9.0", true)]
    #[case("git version 1.8.5.6", false)]
    #[case("git version 1.10.1", true)]
    #[case("git version 2.24.3 (Apple Git-128)", true)]
    #[case("", false)]
    fn shallow_support_from_version(#[case] output: &str, #[case] expected: bool) {
        assert_eq!(git_supports_shallow(output), expected);
    }

    #[test]
    fn manifest_branch_is_optional() {
        let apps: Vec<AppSpec> = serde_json::from_str(
            r#"[{"name":"erpnext","url":"https://example.com/erpnext.git","branch":"develop"},
                {"name":"shopping_cart","url":"https://example.com/cart.git"}]"#,
        )
        .unwrap();
        assert_eq!(apps[0].branch.as_deref(), Some("develop"));
        assert_eq!(apps[1].branch, None);
    }

    #[test]
    fn clone_is_shallow_only_with_capable_git() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = RecordingRunner::new().respond("git --version", "git version 1.8.3\n");
        let o = Orchestrator::new(dir.path(), runner).unwrap();

        o.get_app("frappe", "https://example.com/frappe.git", Some("develop"))
            .unwrap();

        let clone = o
            .runner()
            .calls()
            .into_iter()
            .find(|c| c.command.starts_with("git clone"))
            .unwrap();
        assert_eq!(
            clone.command,
            "git clone 'https://example.com/frappe.git' --branch develop --origin upstream frappe"
        );
        assert_eq!(clone.cwd, dir.path().join("apps"));
    }
}
