//! ConfigStore and SiteRegistry integration tests against a real bench tree.

use assert_fs::prelude::*;
use bench_core::{
    config, paths, sites,
    types::{BenchConfig, ConfigMap},
    BenchError, SiteName,
};
use predicates::prelude::predicate;
use rstest::rstest;
use serde_json::json;

fn obj(value: serde_json::Value) -> ConfigMap {
    match value {
        serde_json::Value::Object(m) => m,
        _ => unreachable!(),
    }
}

// ---------------------------------------------------------------------------
// 1. Merge semantics
// ---------------------------------------------------------------------------

#[rstest]
#[case(json!({}), json!({"a": 1}), json!({"a": 1}))]
#[case(json!({"a": 1}), json!({}), json!({"a": 1}))]
#[case(json!({"a": 1, "b": 2}), json!({"b": 3}), json!({"a": 1, "b": 3}))]
#[case(json!({"a": {"x": 1}}), json!({"a": {"y": 2}}), json!({"a": {"y": 2}}))]
#[case(json!({"a": 1}), json!({"a": null}), json!({"a": null}))]
fn update_after_put_equals_merge(
    #[case] first: serde_json::Value,
    #[case] second: serde_json::Value,
    #[case] expected: serde_json::Value,
) {
    let dir = assert_fs::TempDir::new().unwrap();
    let path = dir.child("site_config.json");
    config::put(path.path(), &obj(first)).unwrap();
    config::update(path.path(), obj(second)).unwrap();
    assert_eq!(
        serde_json::Value::Object(config::get(path.path()).unwrap()),
        expected
    );
}

#[test]
fn written_file_is_indented_json() {
    let dir = assert_fs::TempDir::new().unwrap();
    config::put_config(dir.path(), &config::entry("auto_update", false)).unwrap();
    dir.child("config.json")
        .assert(predicate::str::contains("\n  \"auto_update\": false"));
}

// ---------------------------------------------------------------------------
// 2. Scoped stores
// ---------------------------------------------------------------------------

#[test]
fn site_and_common_configs_are_independent() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("sites/one.local").create_dir_all().unwrap();

    config::update_site_config(dir.path(), "one.local", config::entry("nginx_port", 8080))
        .unwrap();
    config::update_common_site_config(dir.path(), config::entry("db_host", "db.internal"))
        .unwrap();

    assert_eq!(
        config::get_site_config(dir.path(), "one.local").unwrap(),
        obj(json!({"nginx_port": 8080}))
    );
    assert_eq!(
        config::get_common_site_config(dir.path()).unwrap(),
        obj(json!({"db_host": "db.internal"}))
    );
}

#[test]
fn typed_bench_config_reads_seeded_file() {
    let dir = assert_fs::TempDir::new().unwrap();
    let seeded = BenchConfig::seed("frappe");
    config::put_config(dir.path(), &seeded.to_map().unwrap()).unwrap();
    let loaded = config::load_bench_config(dir.path()).unwrap();
    assert_eq!(loaded, seeded);
}

#[test]
fn corrupt_site_config_aborts_with_path() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("sites/one.local/site_config.json")
        .write_str("{\"host_name\": ")
        .unwrap();
    let err = config::get_site_config(dir.path(), "one.local").unwrap_err();
    assert!(matches!(err, BenchError::DataCorruption { .. }));
    assert!(err.to_string().contains("site_config.json"));
}

#[cfg(unix)]
#[test]
fn update_keeps_mode_of_existing_site_config() {
    use std::os::unix::fs::PermissionsExt;

    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("sites/one.local/site_config.json");
    file.write_str("{\"db_password\": \"secret\"}").unwrap();
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o600)).unwrap();

    config::update_site_config(dir.path(), "one.local", config::entry("nginx_port", 8080))
        .unwrap();

    let mode = std::fs::metadata(file.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    let stored = config::get_site_config(dir.path(), "one.local").unwrap();
    assert_eq!(stored.get("nginx_port"), Some(&json!(8080)));
    assert_eq!(stored.get("db_password"), Some(&json!("secret")));
}

#[cfg(unix)]
#[test]
fn put_over_read_only_file_is_permission_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("config.json");
    file.write_str("{\"frappe_user\": \"frappe\"}").unwrap();
    std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o444)).unwrap();

    // Root bypasses mode bits; nothing to assert there.
    if std::fs::OpenOptions::new().write(true).open(file.path()).is_ok() {
        return;
    }

    let err = config::put(file.path(), &config::entry("auto_update", true)).unwrap_err();
    assert!(matches!(err, BenchError::Permission { .. }), "{err:?}");
    file.assert("{\"frappe_user\": \"frappe\"}");
    dir.child("config.json.tmp").assert(predicate::path::missing());
}

// ---------------------------------------------------------------------------
// 3. Site registry
// ---------------------------------------------------------------------------

#[test]
fn assets_dir_is_never_a_site() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("sites/assets").create_dir_all().unwrap();
    dir.child("sites/a.local").create_dir_all().unwrap();

    let mut names = sites::list_sites(dir.path()).unwrap();
    names.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(names, vec![SiteName::from("a.local")]);
    assert!(!sites::is_site(dir.path(), "assets").unwrap());
    assert!(sites::is_sole_site(dir.path()).unwrap());
}

#[test]
fn two_sites_are_not_sole() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("sites/a.local").create_dir_all().unwrap();
    dir.child("sites/b.local").create_dir_all().unwrap();
    assert!(!sites::is_sole_site(dir.path()).unwrap());
    assert!(sites::is_site(dir.path(), "b.local").unwrap());
}

#[test]
fn missing_default_marker_is_none() {
    let dir = assert_fs::TempDir::new().unwrap();
    dir.child("sites").create_dir_all().unwrap();
    assert!(sites::default_site(dir.path()).unwrap().is_none());
    assert!(!paths::current_site_path(dir.path()).exists());
}
