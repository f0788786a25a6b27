//! Template contexts: serializable payloads for each rendered artifact.

use serde::{Deserialize, Serialize};

use bench_core::types::ConfigMap;

/// Port a site listens on when its config has no `nginx_port`.
pub const DEFAULT_NGINX_PORT: u16 = 80;

/// Upstream the framework's web process binds to (`Procfile` `web:` entry).
pub const DEFAULT_UPSTREAM: &str = "127.0.0.1:8000";

/// Context for the sudoers entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SudoersContext {
    pub user: String,
    pub supervisorctl: String,
}

/// A certificate / key pair for a TLS server block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslPair {
    pub certificate: String,
    pub certificate_key: String,
}

/// One `server { }` block of the reverse-proxy config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NginxSite {
    pub name: String,
    pub host_name: String,
    pub port: u16,
    pub ssl: Option<SslPair>,
    pub default_server: bool,
}

impl NginxSite {
    /// Build from a site's `site_config.json`.
    ///
    /// `host_name` falls back to the site name, `nginx_port` to 80. A TLS
    /// block is emitted only when both certificate keys are present. Ports
    /// may be recorded as numbers or numeric strings.
    pub fn from_site_config(name: &str, site_config: &ConfigMap, default_server: bool) -> Self {
        let host_name = site_config
            .get("host_name")
            .and_then(|v| v.as_str())
            .map(strip_scheme)
            .unwrap_or(name)
            .to_string();

        let port = site_config
            .get("nginx_port")
            .and_then(|v| match v {
                serde_json::Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
                serde_json::Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .unwrap_or(DEFAULT_NGINX_PORT);

        let cert = site_config.get("ssl_certificate").and_then(|v| v.as_str());
        let key = site_config
            .get("ssl_certificate_key")
            .and_then(|v| v.as_str());
        let ssl = match (cert, key) {
            (Some(c), Some(k)) => Some(SslPair {
                certificate: c.to_string(),
                certificate_key: k.to_string(),
            }),
            _ => None,
        };

        Self {
            name: name.to_string(),
            host_name,
            port,
            ssl,
            default_server,
        }
    }
}

/// Context for `nginx.conf`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NginxContext {
    pub sites_path: String,
    pub upstream: String,
    pub sites: Vec<NginxSite>,
}

fn strip_scheme(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    rest.trim_end_matches('/')
}
