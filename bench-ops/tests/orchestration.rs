//! End-to-end orchestration against a temp directory, with every external
//! command recorded instead of executed.

use std::fs;
use std::path::Path;

use bench_core::{config, paths, sites, BenchConfig, BenchError};
use bench_ops::testing::RecordingRunner;
use bench_ops::{InitOptions, OpsError, Orchestrator, Schedule, UpdateOptions};
use serde_json::json;
use tempfile::TempDir;

fn init_bench(root: &Path) -> Orchestrator<RecordingRunner> {
    let options = InitOptions::new(BenchConfig::seed("frappe"));
    Orchestrator::init(root, options, RecordingRunner::new().with_framework_effects()).unwrap()
}

fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path.clone());
                out.push((path.display().to_string(), Vec::new()));
            } else {
                out.push((path.display().to_string(), fs::read(&path).unwrap()));
            }
        }
    }
    out.sort();
    out
}

#[test]
fn init_creates_layout_config_and_procfile() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("b1");
    let bench = init_bench(&root);

    for name in ["apps", "sites", "config", "logs"] {
        assert!(root.join(name).is_dir(), "{name}/ missing");
    }
    assert!(root.join("config.json").is_file());
    assert!(root.join("Procfile").is_file());

    let on_disk = config::get_config(&root).unwrap();
    assert_eq!(
        serde_json::Value::Object(on_disk),
        json!({
            "restart_supervisor_on_update": false,
            "auto_update": false,
            "serve_default_site": true,
            "rebase_on_pull": false,
            "update_bench_on_update": true,
            "frappe_user": "frappe",
            "shallow_clone": true
        })
    );
    assert_eq!(
        config::get_common_site_config(&root).unwrap(),
        serde_json::Map::new()
    );

    let runner = bench.runner();
    let venv = runner.position("virtualenv").unwrap();
    let clone = runner.position("git clone").unwrap();
    assert!(venv < clone);
    assert!(runner.crontab().contains("--backup all"));
    assert!(!runner.crontab().contains("update --auto"));
}

#[test]
fn init_respects_opt_outs() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("b2");
    let mut options = InitOptions::new(BenchConfig::seed("frappe"));
    options.no_procfile = true;
    options.no_backups = true;
    let bench = Orchestrator::init(&root, options, RecordingRunner::new()).unwrap();

    assert!(!root.join("Procfile").exists());
    assert!(bench.runner().position("crontab").is_none());
}

#[test]
fn init_on_existing_path_changes_nothing() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("keep.txt"), "x").unwrap();
    let before = snapshot(tmp.path());

    let runner = RecordingRunner::new();
    let options = InitOptions::new(BenchConfig::seed("frappe"));
    let err = Orchestrator::init(tmp.path(), options, runner).err().unwrap();

    assert!(matches!(err, OpsError::Bench(BenchError::AlreadyExists { .. })));
    assert_eq!(snapshot(tmp.path()), before);
}

#[test]
fn init_with_failing_clone_stops_before_procfile() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("b3");
    let options = InitOptions::new(BenchConfig::seed("frappe"));
    let err = Orchestrator::init(&root, options, RecordingRunner::new().fail_on("git clone", 128))
        .err()
        .unwrap();

    assert_eq!(err.exit_code(), Some(128));
    assert!(root.join("config.json").exists());
    assert!(!root.join("Procfile").exists());
}

#[test]
fn first_site_becomes_default_second_does_not() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("b");
    let bench = init_bench(&root);

    assert!(bench.new_site("one.local", Some("root"), None).unwrap());
    assert_eq!(
        sites::default_site(&root).unwrap().map(|s| s.0),
        Some("one.local".to_string())
    );

    assert!(!bench.new_site("two.local", None, None).unwrap());
    assert_eq!(
        sites::default_site(&root).unwrap().map(|s| s.0),
        Some("one.local".to_string())
    );
    let uses = bench
        .runner()
        .commands()
        .into_iter()
        .filter(|c| c.contains("--use"))
        .count();
    assert_eq!(uses, 1);
}

#[test]
fn unknown_site_property_leaves_files_untouched() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("b");
    let bench = init_bench(&root);
    bench.new_site("one.local", None, None).unwrap();
    let before = snapshot(&root);

    let err = bench.set_nginx_port("nope.local", 8080).unwrap_err();

    assert!(matches!(err, OpsError::Bench(BenchError::NoSuchSite { .. })));
    assert_eq!(snapshot(&root), before);
}

#[test]
fn site_property_regenerates_nginx_config() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("b");
    let bench = init_bench(&root);
    bench.new_site("one.local", None, None).unwrap();

    bench.set_nginx_port("one.local", 8080).unwrap();

    let site_config = config::get_site_config(&root, "one.local").unwrap();
    assert_eq!(site_config.get("nginx_port"), Some(&json!(8080)));
    let nginx = fs::read_to_string(paths::config_dir(&root).join("nginx.conf")).unwrap();
    assert!(nginx.contains("listen 8080 default_server;"));
}

#[test]
fn backup_all_sites_aborts_on_first_failure() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    for site in ["a", "b"] {
        fs::create_dir_all(paths::site_dir(root, site)).unwrap();
    }
    let runner = RecordingRunner::new().fail_on("--backup a", 1);
    let bench = Orchestrator::new(root, runner).unwrap();

    assert!(bench.backup_all_sites().is_err());
    let commands = bench.runner().commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].ends_with("--backup a"));
}

#[test]
fn backup_schedule_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let runner = RecordingRunner::new().with_crontab("MAILTO=ops\n");
    let bench = Orchestrator::new(tmp.path(), runner).unwrap();

    assert_eq!(bench.setup_backups().unwrap(), Schedule::Added);
    assert_eq!(bench.setup_backups().unwrap(), Schedule::AlreadyPresent);

    let tab = bench.runner().crontab();
    assert!(tab.starts_with("MAILTO=ops\n"));
    assert_eq!(tab.matches("--backup all").count(), 1);
}

#[test]
fn update_runs_steps_in_order_then_restarts() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir_all(paths::apps_dir(root).join("frappe/.git")).unwrap();
    fs::write(paths::apps_dir(root).join("frappe/requirements.txt"), "six\n").unwrap();
    config::put_config(
        root,
        &config::entry("restart_supervisor_on_update", true),
    )
    .unwrap();
    let bench = Orchestrator::new(root, RecordingRunner::new()).unwrap();

    let report = bench.update(&UpdateOptions::default()).unwrap();
    assert!(report.pulled && report.requirements && report.patched && report.built);
    assert!(report.restarted);

    let r = bench.runner();
    let order = [
        r.position("git pull upstream").unwrap(),
        r.position("install -q -r").unwrap(),
        r.position("--latest all").unwrap(),
        r.position("--build").unwrap(),
        r.position("supervisorctl restart").unwrap(),
    ];
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");
}

#[test]
fn apps_manifest_installs_each_app() {
    let tmp = TempDir::new().unwrap();
    let manifest = tmp.path().join("apps.json");
    fs::write(
        &manifest,
        r#"[{"name": "erpnext", "url": "https://example.com/erpnext.git", "branch": "v4"},
            {"name": "shop", "url": "https://example.com/shop.git"}]"#,
    )
    .unwrap();
    let bench = Orchestrator::new(tmp.path(), RecordingRunner::new()).unwrap();

    let apps = bench
        .install_apps_from_path(&manifest.display().to_string())
        .unwrap();

    assert_eq!(apps.len(), 2);
    let clones: Vec<String> = bench
        .runner()
        .commands()
        .into_iter()
        .filter(|c| c.starts_with("git clone"))
        .collect();
    assert_eq!(clones.len(), 2);
    assert!(clones[0].contains("--branch v4"));
    assert!(clones[1].ends_with("--origin upstream shop"));
}
