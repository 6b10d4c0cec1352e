//! Tests for TOML configuration loading and graceful degradation
//!
//! Covers:
//! - explicit config files (present, missing, malformed)
//! - default-location lookup through XDG_CONFIG_HOME
//! - missing default file falls back to built-in defaults
//! - the fallback is announced through tracing
//!
//! Tests that manipulate XDG_CONFIG_HOME are marked #[serial].

use serial_test::serial;
use solar_common::config::{
    default_config_path, load_toml_config, FallbackMode, TomlConfig,
};
use std::env;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

/// Log sink for a scoped test subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records everything it logs
fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, logs.text())
}

const FULL_CONFIG: &str = r#"
[relay]
host = "0.0.0.0"
port = 8088
api_key = "toml-key"
model = "gemini-2.5-flash"
gemini_base_url = "http://127.0.0.1:9999/v1beta"
fallback_mode = "report"
max_body_bytes = 2048
upstream_timeout_secs = 15

[review]
relay_url = "http://relay.internal:8088"
timeout_secs = 30

[logging]
level = "debug"
"#;

#[test]
fn test_explicit_file_with_all_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solar.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = load_toml_config(Some(&path)).unwrap();

    assert_eq!(config.relay.host.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.relay.port, Some(8088));
    assert_eq!(config.relay.api_key.as_deref(), Some("toml-key"));
    assert_eq!(config.relay.model.as_deref(), Some("gemini-2.5-flash"));
    assert_eq!(config.relay.fallback_mode, Some(FallbackMode::Report));
    assert_eq!(config.relay.max_body_bytes, Some(2048));
    assert_eq!(config.relay.upstream_timeout_secs, Some(15));
    assert_eq!(
        config.review.relay_url.as_deref(),
        Some("http://relay.internal:8088")
    );
    assert_eq!(config.review.timeout_secs, Some(30));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_partial_file_leaves_other_keys_unset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(&path, "[relay]\nport = 7000\n").unwrap();

    let config = load_toml_config(Some(&path)).unwrap();

    assert_eq!(config.relay.port, Some(7000));
    assert!(config.relay.api_key.is_none());
    assert!(config.relay.fallback_mode.is_none());
    assert!(config.review.relay_url.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let err = load_toml_config(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[relay\nport = ").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
fn test_unknown_fallback_mode_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mode.toml");
    fs::write(&path, "[relay]\nfallback_mode = \"silent\"\n").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_default_location_is_used_when_present() {
    let dir = tempfile::tempdir().unwrap();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let config_dir = dir.path().join("solar-audit");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[review]\ntimeout_secs = 9\n").unwrap();

    assert_eq!(default_config_path(), Some(config_dir.join("config.toml")));
    let config = load_toml_config(None).unwrap();
    assert_eq!(config.review.timeout_secs, Some(9));

    env::remove_var("XDG_CONFIG_HOME");
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_missing_default_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let config = load_toml_config(None).unwrap();
    let defaults = TomlConfig::default();
    assert_eq!(config.relay.port, defaults.relay.port);
    assert_eq!(config.logging.level, "info");

    env::remove_var("XDG_CONFIG_HOME");
}

#[test]
#[serial]
#[cfg(target_os = "linux")]
fn test_missing_default_file_logs_warning() {
    let dir = tempfile::tempdir().unwrap();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let (config, logs) = with_captured_logs(|| load_toml_config(None));
    assert!(config.is_ok());
    assert!(logs.contains("WARN"), "logs: {}", logs);
    assert!(logs.contains("No config file at"), "logs: {}", logs);
    assert!(logs.contains("using built-in defaults"), "logs: {}", logs);

    env::remove_var("XDG_CONFIG_HOME");
}

#[test]
fn test_loaded_file_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solar.toml");
    fs::write(&path, FULL_CONFIG).unwrap();

    let (config, logs) = with_captured_logs(|| load_toml_config(Some(&path)));
    assert!(config.is_ok());
    assert!(logs.contains("Loaded configuration from"), "logs: {}", logs);
}
