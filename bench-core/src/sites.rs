//! Site registry: sites are the subdirectories of `<bench>/sites/`.
//!
//! Listing order is whatever the directory listing yields. Nothing in this
//! crate relies on it.

use std::path::Path;

use crate::error::{io_err, BenchError};
use crate::paths::{self, ASSETS_DIR};
use crate::types::SiteName;

/// Every directory under `sites/` except `assets`.
///
/// A bench without a `sites/` directory has no sites.
pub fn list_sites(bench: &Path) -> Result<Vec<SiteName>, BenchError> {
    let dir = paths::sites_dir(bench);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut sites = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
        let path = entry.map_err(|e| io_err(&dir, e))?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if name != ASSETS_DIR {
            sites.push(SiteName::from(name));
        }
    }
    Ok(sites)
}

pub fn is_site(bench: &Path, name: &str) -> Result<bool, BenchError> {
    Ok(list_sites(bench)?.iter().any(|s| s.0 == name))
}

/// `true` iff the bench holds exactly one site.
pub fn is_sole_site(bench: &Path) -> Result<bool, BenchError> {
    Ok(list_sites(bench)?.len() == 1)
}

/// `Ok(())` if `name` is a site of this bench, `NoSuchSite` otherwise.
pub fn require_site(bench: &Path, name: &str) -> Result<(), BenchError> {
    if is_site(bench, name)? {
        Ok(())
    } else {
        Err(BenchError::NoSuchSite {
            site: name.to_string(),
        })
    }
}

/// The default site as recorded by the framework CLI in
/// `sites/currentsite.txt`. Read-only here.
pub fn default_site(bench: &Path) -> Result<Option<SiteName>, BenchError> {
    let path = paths::current_site_path(bench);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let name = contents.trim();
    if name.is_empty() {
        Ok(None)
    } else {
        Ok(Some(SiteName::from(name)))
    }
}
