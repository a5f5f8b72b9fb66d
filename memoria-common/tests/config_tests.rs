//! Integration tests for bootstrap configuration and secret resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate MEMORIA_TEST_* variables are marked with #[serial].

use memoria_common::config::{load_toml_config, resolve_secret, TomlConfig};
use memoria_common::Error;
use serial_test::serial;
use std::env;
use std::io::Write;

#[test]
fn test_missing_config_file_is_reported_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    assert!(load_toml_config(&path).unwrap().is_none());

    let defaults = TomlConfig::default();
    assert!(defaults.logging.level.is_none());
    assert!(defaults.storage.bucket.is_none());
}

#[test]
fn test_config_without_logging_section_leaves_level_unset() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[tmdb]\npages_to_fetch = 3").unwrap();

    let config = load_toml_config(file.path()).unwrap().unwrap();

    assert!(config.logging.level.is_none());
    assert_eq!(config.tmdb.pages_to_fetch, 3);
}

#[test]
fn test_full_config_file_is_parsed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[logging]
level = "debug"

[analysis]
primary_model = "gemini-2.5-pro"
fallback_model = "gemini-2.5-flash"
poll_interval_ms = 250
poll_timeout_secs = 60
staging_dir = "/var/tmp/memoria"
prompt = "Describe. ||INDIVIDUALS||: names"

[tmdb]
token = "tmdb-token"

[storage]
bucket = "memories"
region = "us-east-005"
endpoint = "https://s3.us-east-005.backblazeb2.com"
url_expiry_secs = 600
"#
    )
    .unwrap();

    let config = load_toml_config(file.path()).unwrap().unwrap();

    assert_eq!(config.logging.level.as_deref(), Some("debug"));
    assert_eq!(config.analysis.primary_model, "gemini-2.5-pro");
    assert_eq!(config.analysis.fallback_model, "gemini-2.5-flash");
    assert_eq!(config.analysis.poll_interval_ms, 250);
    assert_eq!(config.analysis.poll_timeout_secs, 60);
    assert_eq!(
        config.analysis.staging_dir.as_deref(),
        Some(std::path::Path::new("/var/tmp/memoria"))
    );
    assert!(config.analysis.prompt.unwrap().contains("||INDIVIDUALS||:"));
    assert_eq!(config.tmdb.token.as_deref(), Some("tmdb-token"));
    assert_eq!(config.tmdb.pages_to_fetch, 5);
    assert_eq!(config.storage.bucket.as_deref(), Some("memories"));
    assert_eq!(config.storage.url_expiry_secs, 600);
}

#[test]
fn test_invalid_config_file_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[analysis\npoll_interval_ms = ").unwrap();

    let result = load_toml_config(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_environment_overrides_toml() {
    env::set_var("MEMORIA_TEST_SECRET", "env-key");

    let resolved = resolve_secret("MEMORIA_TEST_SECRET", Some("toml-key"));
    assert_eq!(resolved.as_deref(), Some("env-key"));

    env::remove_var("MEMORIA_TEST_SECRET");
}

#[test]
#[serial]
fn test_toml_used_when_environment_missing() {
    env::remove_var("MEMORIA_TEST_SECRET");

    let resolved = resolve_secret("MEMORIA_TEST_SECRET", Some("toml-key"));
    assert_eq!(resolved.as_deref(), Some("toml-key"));
}

#[test]
#[serial]
fn test_blank_values_are_ignored() {
    env::set_var("MEMORIA_TEST_SECRET", "   ");

    assert_eq!(resolve_secret("MEMORIA_TEST_SECRET", Some("")), None);
    assert_eq!(
        resolve_secret("MEMORIA_TEST_SECRET", Some("toml-key")).as_deref(),
        Some("toml-key")
    );

    env::remove_var("MEMORIA_TEST_SECRET");
}
