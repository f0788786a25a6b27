//! Rendered-output tests for every bench artifact.

use bench_renderer::{NginxContext, NginxSite, Renderer, SslPair, SudoersContext};

fn site(name: &str, port: u16, ssl: bool, default_server: bool) -> NginxSite {
    NginxSite {
        name: name.to_string(),
        host_name: name.to_string(),
        port,
        ssl: ssl.then(|| SslPair {
            certificate: format!("/etc/ssl/{name}.crt"),
            certificate_key: format!("/etc/ssl/{name}.key"),
        }),
        default_server,
    }
}

fn nginx_ctx(sites: Vec<NginxSite>) -> NginxContext {
    NginxContext {
        sites_path: "/home/frappe/bench/sites".to_string(),
        upstream: "127.0.0.1:8000".to_string(),
        sites,
    }
}

#[test]
fn procfile_declares_web_worker_and_beat() {
    let out = Renderer::new().unwrap().procfile().unwrap();
    let lines: Vec<&str> = out.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(
        lines,
        vec![
            "web: ./env/bin/frappe --serve --sites_path sites",
            "worker: sh -c 'cd sites && exec ../env/bin/python -m frappe.celery_app worker'",
            "workerbeat: sh -c 'cd sites && exec ../env/bin/python -m frappe.celery_app beat -s scheduler.schedule'",
        ]
    );
}

#[test]
fn sudoers_entry_is_a_single_line() {
    let out = Renderer::new()
        .unwrap()
        .sudoers(&SudoersContext {
            user: "frappe".to_string(),
            supervisorctl: "/usr/bin/supervisorctl".to_string(),
        })
        .unwrap();
    assert_eq!(
        out.trim_end(),
        "frappe ALL=(ALL) NOPASSWD: /usr/bin/supervisorctl restart frappe\\:"
    );
    assert_eq!(out.trim_end().lines().count(), 1);
}

#[test]
fn nginx_conf_has_one_server_block_per_site() {
    let out = Renderer::new()
        .unwrap()
        .nginx_conf(&nginx_ctx(vec![
            site("a.local", 80, false, true),
            site("b.local", 8080, false, false),
        ]))
        .unwrap();
    assert_eq!(out.matches("server {").count(), 2);
    assert!(out.contains("listen 80 default_server;"));
    assert!(out.contains("listen 8080;"));
    assert!(out.contains("server_name b.local;"));
    assert!(out.contains("root /home/frappe/bench/sites;"));
    assert!(!out.contains("ssl_certificate"));
}

#[test]
fn nginx_conf_emits_tls_block_only_for_ssl_sites() {
    let out = Renderer::new()
        .unwrap()
        .nginx_conf(&nginx_ctx(vec![
            site("secure.local", 443, true, false),
            site("plain.local", 80, false, false),
        ]))
        .unwrap();
    assert!(out.contains("listen 443 ssl;"));
    assert_eq!(out.matches("ssl_certificate_key").count(), 1);
    assert!(out.contains("/etc/ssl/secure.local.crt"));
}

#[test]
fn nginx_conf_with_no_sites_still_declares_upstream() {
    let out = Renderer::new().unwrap().nginx_conf(&nginx_ctx(vec![])).unwrap();
    assert!(out.contains("upstream frappe"));
    assert!(!out.contains("server_name"));
}

#[test]
fn cached_requirements_lists_packages() {
    let out = Renderer::new().unwrap().cached_requirements().unwrap();
    assert!(out.lines().any(|l| l == "Werkzeug"));
}
