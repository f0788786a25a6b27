//! Reverse-proxy configuration regenerated from every site's config.

use std::path::PathBuf;

use bench_core::{config, paths, sites};
use bench_renderer::context::DEFAULT_UPSTREAM;
use bench_renderer::{NginxContext, NginxSite};

use crate::bench::Orchestrator;
use crate::error::OpsError;
use crate::runner::ProcessRunner;

impl<R: ProcessRunner> Orchestrator<R> {
    /// Render `config/nginx.conf` with one server block per site, sorted by
    /// name. With `serve_default_site` the default site's block is marked
    /// `default_server`.
    pub fn generate_nginx_config(&self) -> Result<PathBuf, OpsError> {
        let bench = self.bench();
        let default_site = if self.config()?.serve_default_site {
            sites::default_site(bench)?
        } else {
            None
        };

        let mut names = sites::list_sites(bench)?;
        names.sort_by(|a, b| a.0.cmp(&b.0));

        let mut servers = Vec::with_capacity(names.len());
        for name in &names {
            let site_config = config::get_site_config(bench, name.as_ref())?;
            let is_default = default_site.as_ref() == Some(name);
            servers.push(NginxSite::from_site_config(name.as_ref(), &site_config, is_default));
        }

        let ctx = NginxContext {
            sites_path: self.sites_dir().display().to_string(),
            upstream: DEFAULT_UPSTREAM.to_string(),
            sites: servers,
        };
        let rendered = self.renderer()?.nginx_conf(&ctx)?;

        let path = paths::config_dir(bench).join("nginx.conf");
        self.write_file(&path, &format!("{}\n", rendered.trim_end()))?;
        tracing::info!("wrote {} ({} sites)", path.display(), names.len());
        Ok(path)
    }
}
