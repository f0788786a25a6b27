//! Tera rendering engine: [`Artifact`] enum and [`Renderer`].
//!
//! # Artifact mapping
//!
//! | Artifact             | Written to (by bench-ops)             |
//! |----------------------|---------------------------------------|
//! | Procfile             | `<bench>/Procfile`                    |
//! | Sudoers              | `/etc/sudoers.d/frappe`               |
//! | NginxConf            | `<bench>/config/nginx.conf`           |
//! | CachedRequirements   | `<bench>/config/cached_requirements.txt` |
//!
//! A bench may override any embedded template by placing a file with the
//! same name under `<bench>/config/templates/`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use crate::context::{NginxContext, SudoersContext};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("procfile.tera", include_str!("templates/procfile.tera")),
    ("sudoers.tera", include_str!("templates/sudoers.tera")),
    ("nginx.conf.tera", include_str!("templates/nginx.conf.tera")),
    (
        "cached_requirements.txt.tera",
        include_str!("templates/cached_requirements.txt.tera"),
    ),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn load_override_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut templates = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let name = normalize_template_name(Path::new(&entry.file_name()));
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(override_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(normalize_template_name(Path::new(name)), (*content).to_string());
    }
    if let Some(dir) = override_dir {
        for (name, content) in load_override_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    // Generated files are config, not HTML.
    tera.autoescape_on(vec![]);
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// Every file the bench tool renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Procfile,
    Sudoers,
    NginxConf,
    CachedRequirements,
}

impl Artifact {
    pub fn all() -> &'static [Artifact] {
        &[
            Artifact::Procfile,
            Artifact::Sudoers,
            Artifact::NginxConf,
            Artifact::CachedRequirements,
        ]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            Artifact::Procfile => "procfile.tera",
            Artifact::Sudoers => "sudoers.tera",
            Artifact::NginxConf => "nginx.conf.tera",
            Artifact::CachedRequirements => "cached_requirements.txt.tera",
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders [`Artifact`]s from embedded templates plus optional overrides.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_overrides(None)
    }

    /// Embedded templates, replaced by any same-named `.tera` file found in
    /// `override_dir`.
    pub fn with_overrides(override_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Self {
            tera: build_tera(override_dir)?,
        })
    }

    /// Render `artifact` with any serializable context. Line endings are
    /// normalised to LF.
    pub fn render<C: Serialize>(&self, artifact: Artifact, ctx: &C) -> Result<String, RenderError> {
        let value = serde_json::to_value(ctx)?;
        let tera_ctx = Context::from_value(value)?;
        let rendered = self.tera.render(artifact.template_name(), &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }

    pub fn procfile(&self) -> Result<String, RenderError> {
        self.render(Artifact::Procfile, &serde_json::json!({}))
    }

    pub fn sudoers(&self, ctx: &SudoersContext) -> Result<String, RenderError> {
        self.render(Artifact::Sudoers, ctx)
    }

    pub fn nginx_conf(&self, ctx: &NginxContext) -> Result<String, RenderError> {
        self.render(Artifact::NginxConf, ctx)
    }

    pub fn cached_requirements(&self) -> Result<String, RenderError> {
        self.render(Artifact::CachedRequirements, &serde_json::json!({}))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
