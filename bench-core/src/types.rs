//! Domain types for bench configuration and sites.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A flat JSON object as stored in every config file.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Fallback when `supervisor_restart_cmd` is not recorded.
pub const DEFAULT_SUPERVISOR_RESTART_CMD: &str = "sudo supervisorctl restart frappe:";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed site name (a directory under `sites/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteName(pub String);

impl fmt::Display for SiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SiteName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SiteName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for SiteName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// BenchConfig
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// Typed view over `config.json`.
///
/// Every documented key has a serde default so a partial (or missing) file
/// still loads. Keys this type does not know about round-trip through
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub restart_supervisor_on_update: bool,
    #[serde(default)]
    pub auto_update: bool,
    #[serde(default = "default_true")]
    pub serve_default_site: bool,
    #[serde(default)]
    pub rebase_on_pull: bool,
    #[serde(default = "default_true")]
    pub update_bench_on_update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frappe_user: Option<String>,
    #[serde(default = "default_true")]
    pub shallow_clone: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheel_cache_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_restart_cmd: Option<String>,
    #[serde(flatten)]
    pub extra: ConfigMap,
}

impl BenchConfig {
    /// The defaults written by `init`, owned by `frappe_user`.
    pub fn seed(frappe_user: impl Into<String>) -> Self {
        Self {
            restart_supervisor_on_update: false,
            auto_update: false,
            serve_default_site: true,
            rebase_on_pull: false,
            update_bench_on_update: true,
            frappe_user: Some(frappe_user.into()),
            shallow_clone: true,
            wheel_cache_dir: None,
            supervisor_restart_cmd: None,
            extra: ConfigMap::new(),
        }
    }

    pub fn supervisor_restart_cmd(&self) -> &str {
        self.supervisor_restart_cmd
            .as_deref()
            .unwrap_or(DEFAULT_SUPERVISOR_RESTART_CMD)
    }

    /// Flatten back into the on-disk mapping.
    pub fn to_map(&self) -> Result<ConfigMap, serde_json::Error> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(ConfigMap::new()),
        }
    }

    pub fn from_map(map: ConfigMap) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(map))
    }
}
