//! Bench core library: layout paths, JSON config persistence, site registry.
//!
//! - [`paths`]: where everything lives inside a bench directory
//! - [`config`]: read / write / merge of bench, site and common-site JSON
//! - [`sites`]: site enumeration and membership
//! - [`types`]: [`SiteName`], [`BenchConfig`], [`ConfigMap`]
//! - [`error`]: [`BenchError`]

pub mod config;
pub mod error;
pub mod paths;
pub mod sites;
pub mod types;

pub use error::BenchError;
pub use types::{BenchConfig, ConfigMap, SiteName};
