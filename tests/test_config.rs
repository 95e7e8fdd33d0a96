use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use wicket::config::Config;

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::load_from(env(&[])).unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.server.worker_count, 16);
    assert_eq!(cfg.server.queue_capacity(), 128);
    assert_eq!(cfg.server.read_chunk_size, 16_384);
    assert_eq!(cfg.static_files.root, PathBuf::from("www"));
}

#[test]
fn test_config_env_overrides() {
    let cfg = Config::load_from(env(&[("LISTEN", "0.0.0.0:3000"), ("WORKERS", "4")])).unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.server.worker_count, 4);
    assert_eq!(cfg.server.queue_capacity(), 32);
}

#[test]
fn test_config_invalid_workers() {
    assert!(Config::load_from(env(&[("WORKERS", "many")])).is_err());
    assert!(Config::load_from(env(&[("WORKERS", "0")])).is_err());
}

#[test]
fn test_config_rejects_oversized_worker_count() {
    let huge = usize::MAX.to_string();
    assert!(Config::load_from(env(&[("WORKERS", huge.as_str())])).is_err());

    let over_backlog = (u32::MAX as usize / 8 + 1).to_string();
    assert!(Config::load_from(env(&[("WORKERS", over_backlog.as_str())])).is_err());

    assert!(Config::from_yaml_str(&format!("server:\n  worker_count: {huge}\n")).is_err());
}

#[test]
fn test_config_invalid_listen_addr() {
    assert!(Config::load_from(env(&[("LISTEN", "localhost")])).is_err());
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml_str(
        "server:\n  worker_count: 2\nstatic_files:\n  root: /srv/www\n",
    )
    .unwrap();

    assert_eq!(cfg.server.worker_count, 2);
    assert_eq!(cfg.server.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.server.poll_interval_ms, 1000);
    assert_eq!(cfg.static_files.root, PathBuf::from("/srv/www"));
}

#[test]
fn test_config_file_then_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "server:\n  listen_addr: \"127.0.0.1:7000\"\n  worker_count: 3").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let cfg = Config::load_from(env(&[("WICKET_CONFIG", path.as_str()), ("WORKERS", "5")])).unwrap();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:7000");
    assert_eq!(cfg.server.worker_count, 5);
}

#[test]
fn test_config_missing_file() {
    let result = Config::load_from(env(&[("WICKET_CONFIG", "/nonexistent/wicket.yaml")]));
    assert!(result.is_err());
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.server.listen_addr, cfg2.server.listen_addr);
}
