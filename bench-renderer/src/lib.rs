//! # bench-renderer
//!
//! Tera-based rendering of every file the bench tool generates: the
//! `Procfile`, the sudoers entry, the reverse-proxy `nginx.conf` and the
//! cached wheel requirement list.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bench_renderer::{Artifact, Renderer};
//!
//! fn procfile() -> Option<String> {
//!     let renderer = Renderer::new().ok()?;
//!     renderer.render(Artifact::Procfile, &serde_json::json!({})).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{NginxContext, NginxSite, SslPair, SudoersContext};
pub use engine::{Artifact, Renderer};
pub use error::RenderError;
