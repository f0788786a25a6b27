//! JSON config persistence at bench, site and common-site scope.
//!
//! # Write protocol
//!
//! `put` serializes → writes `<file>.tmp` in the same directory → fsync →
//! `rename` over the target. A concurrent reader sees either the old file or
//! the new one, never a torn write. The `.tmp` sibling is removed if any step
//! after its creation fails.
//!
//! An existing target must be writable by the caller (`Permission`
//! otherwise), and its mode is carried over to the replacement.
//!
//! `update` is a shallow merge: keys in the partial mapping replace existing
//! keys, nested objects are not merged recursively.

use std::fs::{File, OpenOptions, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::Error as _;

use crate::error::{io_err, BenchError};
use crate::paths;
use crate::types::{BenchConfig, ConfigMap};

// ---------------------------------------------------------------------------
// 1. Generic store
// ---------------------------------------------------------------------------

/// Read the JSON object at `path`. A missing file is an empty mapping.
pub fn get(path: &Path) -> Result<ConfigMap, BenchError> {
    if !path.exists() {
        return Ok(ConfigMap::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let value: serde_json::Value =
        serde_json::from_str(&contents).map_err(|source| BenchError::DataCorruption {
            path: path.to_path_buf(),
            source,
        })?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(BenchError::DataCorruption {
            path: path.to_path_buf(),
            source: serde_json::Error::custom(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            )),
        }),
    }
}

/// Overwrite `path` with `map`, pretty-printed.
pub fn put(path: &Path, map: &ConfigMap) -> Result<(), BenchError> {
    let json = serde_json::to_string_pretty(map)?;
    let existing = existing_permissions(path)?;
    let tmp = tmp_path(path);

    let written = write_synced(&tmp, json.as_bytes()).and_then(|()| match existing {
        Some(perms) => std::fs::set_permissions(&tmp, perms).map_err(|e| io_err(&tmp, e)),
        None => Ok(()),
    });
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// `put(path, merge(get(path), partial))`. Returns the merged mapping.
pub fn update(path: &Path, partial: ConfigMap) -> Result<ConfigMap, BenchError> {
    let mut map = get(path)?;
    merge(&mut map, partial);
    put(path, &map)?;
    Ok(map)
}

/// Shallow merge; `partial` wins on conflict.
pub fn merge(base: &mut ConfigMap, partial: ConfigMap) {
    for (key, value) in partial {
        base.insert(key, value);
    }
}

// ---------------------------------------------------------------------------
// 2. Bench scope
// ---------------------------------------------------------------------------

pub fn get_config(bench: &Path) -> Result<ConfigMap, BenchError> {
    get(&paths::config_path(bench))
}

pub fn put_config(bench: &Path, map: &ConfigMap) -> Result<(), BenchError> {
    put(&paths::config_path(bench), map)
}

pub fn update_config(bench: &Path, partial: ConfigMap) -> Result<ConfigMap, BenchError> {
    update(&paths::config_path(bench), partial)
}

/// Typed view of `config.json`. Mistyped known keys are corruption.
pub fn load_bench_config(bench: &Path) -> Result<BenchConfig, BenchError> {
    let path = paths::config_path(bench);
    let map = get(&path)?;
    BenchConfig::from_map(map).map_err(|source| BenchError::DataCorruption { path, source })
}

// ---------------------------------------------------------------------------
// 3. Site scope
// ---------------------------------------------------------------------------

pub fn get_site_config(bench: &Path, site: &str) -> Result<ConfigMap, BenchError> {
    get(&paths::site_config_path(bench, site))
}

pub fn put_site_config(bench: &Path, site: &str, map: &ConfigMap) -> Result<(), BenchError> {
    put(&paths::site_config_path(bench, site), map)
}

pub fn update_site_config(
    bench: &Path,
    site: &str,
    partial: ConfigMap,
) -> Result<ConfigMap, BenchError> {
    update(&paths::site_config_path(bench, site), partial)
}

pub fn get_common_site_config(bench: &Path) -> Result<ConfigMap, BenchError> {
    get(&paths::common_site_config_path(bench))
}

pub fn update_common_site_config(
    bench: &Path,
    partial: ConfigMap,
) -> Result<ConfigMap, BenchError> {
    update(&paths::common_site_config_path(bench), partial)
}

/// Single-entry mapping, the common shape of every `update_*` call.
pub fn entry(key: impl Into<String>, value: impl Into<serde_json::Value>) -> ConfigMap {
    let mut map = ConfigMap::new();
    map.insert(key.into(), value.into());
    map
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.tmp"))
}

/// Mode of an existing target, after checking the caller may write it.
/// `None` when the target does not exist yet.
fn existing_permissions(path: &Path) -> Result<Option<Permissions>, BenchError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };
    OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    Ok(Some(meta.permissions()))
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), BenchError> {
    let mut file = File::create(path).map_err(|e| io_err(path, e))?;
    file.write_all(bytes).map_err(|e| io_err(path, e))?;
    file.sync_all().map_err(|e| io_err(path, e))?;
    Ok(())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
