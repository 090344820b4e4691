//! Integration tests for configuration resolution
//!
//! Uses serial_test to prevent ENV variable race conditions: tests that touch
//! POSLOG_* variables are marked with #[serial].

use poslog_common::config::{
    load_toml_config, resolve_bool, resolve_path, resolve_string, write_toml_config,
    ConfigFileResolver, LoggingConfig, TomlConfig, CONFIG_ENV_VAR, MANUAL_COLUMN_ENV_VAR,
    OUTPUT_ENV_VAR, STRICT_UNSOLVED_ENV_VAR, TAGSET_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn sample_config() -> TomlConfig {
    TomlConfig {
        input: Some(PathBuf::from("/data/tagged.jsonl")),
        output: None,
        tagset: Some("upos".to_string()),
        strict_unsolved_mode: Some(true),
        prefill_majority: Some(false),
        manual_column: Some("ManualTagging".to_string()),
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

#[test]
fn test_write_then_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    write_toml_config(&sample_config(), &path).unwrap();
    let loaded = load_toml_config(&path).unwrap();

    assert_eq!(loaded, sample_config());
    assert!(!path.with_extension("toml.tmp").exists());
}

#[test]
fn test_malformed_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "strict_unsolved_mode = \"not a bool").unwrap();

    let err = load_toml_config(&path).unwrap_err();
    assert!(matches!(err, poslog_common::Error::Config(_)));
}

#[test]
#[serial]
fn test_cli_path_beats_env_path() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolver = ConfigFileResolver::new(Some(PathBuf::from("/tmp/from-cli.toml")));

    assert_eq!(resolver.resolve(), Some(PathBuf::from("/tmp/from-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");
    let resolver = ConfigFileResolver::new(None);

    assert_eq!(resolver.resolve(), Some(PathBuf::from("/tmp/from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_config_file_degrades_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let resolver = ConfigFileResolver::new(Some(dir.path().join("absent.toml")));

    let config = resolver.load().unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_load_reads_existing_file() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    write_toml_config(&sample_config(), &path).unwrap();

    let config = ConfigFileResolver::new(Some(path)).load().unwrap();
    assert_eq!(config.strict_unsolved_mode, Some(true));
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_bool_env_overrides_toml() {
    env::set_var(STRICT_UNSOLVED_ENV_VAR, "yes");
    assert!(resolve_bool(None, STRICT_UNSOLVED_ENV_VAR, Some(false), false));

    env::set_var(STRICT_UNSOLVED_ENV_VAR, "garbage");
    assert!(!resolve_bool(None, STRICT_UNSOLVED_ENV_VAR, Some(false), true));

    env::remove_var(STRICT_UNSOLVED_ENV_VAR);
    assert!(resolve_bool(None, STRICT_UNSOLVED_ENV_VAR, None, true));
}

#[test]
#[serial]
fn test_string_env_overrides_toml() {
    env::set_var(TAGSET_ENV_VAR, "ptb");
    assert_eq!(
        resolve_string(None, TAGSET_ENV_VAR, Some("upos".to_string())),
        Some("ptb".to_string())
    );

    env::remove_var(TAGSET_ENV_VAR);
    assert_eq!(
        resolve_string(None, TAGSET_ENV_VAR, Some("upos".to_string())),
        Some("upos".to_string())
    );
}

#[test]
#[serial]
fn test_path_resolution_order() {
    env::set_var(OUTPUT_ENV_VAR, "/tmp/env-out.jsonl");
    assert_eq!(
        resolve_path(None, OUTPUT_ENV_VAR, Some(PathBuf::from("/tmp/toml-out.jsonl"))),
        Some(PathBuf::from("/tmp/env-out.jsonl"))
    );
    assert_eq!(
        resolve_path(
            Some(PathBuf::from("/tmp/cli-out.jsonl")),
            OUTPUT_ENV_VAR,
            None
        ),
        Some(PathBuf::from("/tmp/cli-out.jsonl"))
    );

    env::remove_var(OUTPUT_ENV_VAR);
    assert_eq!(resolve_path(None, OUTPUT_ENV_VAR, None), None);
}

#[test]
#[serial]
fn test_manual_column_resolution_order() {
    let toml = Some("ManualTagging".to_string());

    env::set_var(MANUAL_COLUMN_ENV_VAR, "reviewed");
    assert_eq!(
        resolve_string(None, MANUAL_COLUMN_ENV_VAR, toml.clone()),
        Some("reviewed".to_string())
    );
    assert_eq!(
        resolve_string(Some("cli_col".to_string()), MANUAL_COLUMN_ENV_VAR, toml.clone()),
        Some("cli_col".to_string())
    );

    env::remove_var(MANUAL_COLUMN_ENV_VAR);
    assert_eq!(
        resolve_string(None, MANUAL_COLUMN_ENV_VAR, toml),
        Some("ManualTagging".to_string())
    );
}
