use std::path::{Path, PathBuf};

pub const BENCH_SUBDIRS: [&str; 4] = ["apps", "sites", "config", "logs"];

pub const CONFIG_FILE: &str = "config.json";
pub const SITE_CONFIG_FILE: &str = "site_config.json";
pub const COMMON_SITE_CONFIG_FILE: &str = "common_site_config.json";
pub const CURRENT_SITE_FILE: &str = "currentsite.txt";
pub const PROCFILE: &str = "Procfile";
pub const BENCH_LOG: &str = "bench.log";

/// Entry under `sites/` that holds built assets, never a site.
pub const ASSETS_DIR: &str = "assets";

pub fn config_path(bench: &Path) -> PathBuf {
    bench.join(CONFIG_FILE)
}

pub fn apps_dir(bench: &Path) -> PathBuf {
    bench.join("apps")
}

pub fn sites_dir(bench: &Path) -> PathBuf {
    bench.join("sites")
}

pub fn config_dir(bench: &Path) -> PathBuf {
    bench.join("config")
}

pub fn logs_dir(bench: &Path) -> PathBuf {
    bench.join("logs")
}

pub fn site_dir(bench: &Path, site: &str) -> PathBuf {
    sites_dir(bench).join(site)
}

pub fn site_config_path(bench: &Path, site: &str) -> PathBuf {
    site_dir(bench, site).join(SITE_CONFIG_FILE)
}

pub fn common_site_config_path(bench: &Path) -> PathBuf {
    sites_dir(bench).join(COMMON_SITE_CONFIG_FILE)
}

pub fn current_site_path(bench: &Path) -> PathBuf {
    sites_dir(bench).join(CURRENT_SITE_FILE)
}

pub fn procfile_path(bench: &Path) -> PathBuf {
    bench.join(PROCFILE)
}

pub fn bench_log_path(bench: &Path) -> PathBuf {
    logs_dir(bench).join(BENCH_LOG)
}

/// `<bench>/env/bin/<program>`
pub fn env_bin(bench: &Path, program: &str) -> PathBuf {
    bench.join("env").join("bin").join(program)
}

/// The framework's own CLI inside the bench virtualenv.
pub fn framework_cli(bench: &Path) -> PathBuf {
    env_bin(bench, "frappe")
}

pub fn framework_cli_installed(bench: &Path) -> bool {
    framework_cli(bench).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_config_lives_inside_site_dir() {
        let p = site_config_path(Path::new("/b"), "one.local");
        assert_eq!(p, PathBuf::from("/b/sites/one.local/site_config.json"));
    }

    #[test]
    fn framework_cli_is_in_env_bin() {
        assert_eq!(
            framework_cli(Path::new("/b")),
            PathBuf::from("/b/env/bin/frappe")
        );
    }
}
