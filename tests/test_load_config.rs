use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use repo_ingest::load_config::{load_config, TOKEN_ENV_VAR};

/// A static config file plus the token from the environment produces a merged Config.
#[test]
#[serial]
fn test_load_config_success_injects_token_from_env() {
    let config_yaml = r#"
github:
  api_base: https://github.example.test/api/v3/
  timeout_secs: 10
ingest:
  concurrency: 3
store:
  output_dir: ./tmp/documents
  collection: repos
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    env::set_var(TOKEN_ENV_VAR, "ghp_test_token");

    let config = load_config(Some(config_file.path())).expect("Config should load");

    assert_eq!(config.github.api_base, "https://github.example.test/api/v3/");
    assert_eq!(config.github.timeout_secs, 10);
    assert_eq!(config.github.token.as_deref(), Some("ghp_test_token"));
    assert_eq!(config.ingest.concurrency, 3);
    assert_eq!(config.store.output_dir, PathBuf::from("./tmp/documents"));
    assert_eq!(config.store.collection, "repos");

    let pipeline = config.pipeline();
    assert_eq!(pipeline.api_base, "https://github.example.test/api/v3");
    assert_eq!(pipeline.collection, "repos");
    assert_eq!(pipeline.concurrency, 3);

    // The token must never show up in debug output.
    assert!(!format!("{config:?}").contains("ghp_test_token"));

    env::remove_var(TOKEN_ENV_VAR);
}

/// Without a file or token everything takes its default and access is unauthenticated.
#[test]
#[serial]
fn test_load_config_defaults_without_file_or_token() {
    env::remove_var(TOKEN_ENV_VAR);

    let config = load_config(None::<&Path>).expect("Defaults should load");

    assert_eq!(config.github.api_base, "https://api.github.com");
    assert_eq!(config.github.timeout_secs, 30);
    assert_eq!(config.github.token, None);
    assert_eq!(config.ingest.concurrency, 8);
    assert_eq!(config.store.collection, "github_data");
}

/// Sections left out of the file keep their defaults.
#[test]
#[serial]
fn test_load_config_partial_file_keeps_defaults() {
    env::remove_var(TOKEN_ENV_VAR);
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "ingest:\n  concurrency: 2\n").unwrap();

    let config = load_config(Some(config_file.path())).expect("Config should load");
    assert_eq!(config.ingest.concurrency, 2);
    assert_eq!(config.github.api_base, "https://api.github.com");
    assert_eq!(config.store.output_dir, PathBuf::from("./storage"));
}

#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = load_config(Some(config_file.path())).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_errors_for_missing_file() {
    let err = load_config(Some("/definitely/not/here/config.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
#[serial]
fn test_load_config_rejects_zero_concurrency() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "ingest:\n  concurrency: 0\n").unwrap();

    let err = load_config(Some(config_file.path())).unwrap_err();
    assert!(err.to_string().contains("concurrency"), "{err}");
}
