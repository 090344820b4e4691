//! Configuration loading and setting resolution
//!
//! Config file priority order:
//! 1. Command-line `--config` argument (highest priority)
//! 2. `POSLOG_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/poslog/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! Individual settings are then resolved CLI → ENV → TOML → default.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "POSLOG_CONFIG";
/// Environment override for strict unsolved navigation
pub const STRICT_UNSOLVED_ENV_VAR: &str = "POSLOG_STRICT_UNSOLVED";
/// Environment override for the tagset identifier
pub const TAGSET_ENV_VAR: &str = "POSLOG_TAGSET";
/// Environment override for the output table path
pub const OUTPUT_ENV_VAR: &str = "POSLOG_OUTPUT";
/// Environment override for the manual tag column name
pub const MANUAL_COLUMN_ENV_VAR: &str = "POSLOG_MANUAL_COLUMN";

/// Default name of the column holding the operator's tags
pub const DEFAULT_MANUAL_COLUMN: &str = "manual_tagging";
/// Default tagset identifier
pub const DEFAULT_TAGSET: &str = "upos";

/// Contents of `config.toml`
///
/// Every field is optional so that partial files (or none at all) are valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Session-start table (JSON Lines)
    pub input: Option<PathBuf>,
    /// Where saves are written; defaults to overwriting the input
    pub output: Option<PathBuf>,
    /// Tagset identifier (`upos`, `universal`, `ptb`)
    pub tagset: Option<String>,
    /// Only absent tags count as unsolved during navigation
    pub strict_unsolved_mode: Option<bool>,
    /// Pre-fill manual tags from the majority vote
    pub prefill_majority: Option<bool>,
    /// Column name for the persisted manual tags
    pub manual_column: Option<String>,
    pub logging: LoggingConfig,
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Locates the config file following the priority order above
#[derive(Debug, Clone, Default)]
pub struct ConfigFileResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigFileResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Returns the config file to read, or `None` when compiled defaults apply
    pub fn resolve(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory
        default_config_path().filter(|path| path.exists())
    }

    /// Resolve and load the config, degrading to defaults when no file exists
    pub fn load(&self) -> Result<TomlConfig> {
        match self.resolve() {
            Some(path) if path.exists() => {
                let config = load_toml_config(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(TomlConfig::default())
            }
            None => {
                debug!("No config file found, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// `<config_dir>/poslog/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("poslog").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Write config to `path` atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Parse a boolean flag as written in environment variables
pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolve a boolean setting: CLI → ENV → TOML → default
pub fn resolve_bool(cli: Option<bool>, env_var: &str, toml: Option<bool>, default: bool) -> bool {
    if let Some(value) = cli {
        return value;
    }

    if let Ok(raw) = std::env::var(env_var) {
        match parse_bool_flag(&raw) {
            Some(value) => return value,
            None => warn!("Ignoring {}={:?}: not a boolean", env_var, raw),
        }
    }

    toml.unwrap_or(default)
}

/// Resolve a string setting: CLI → ENV → TOML
pub fn resolve_string(cli: Option<String>, env_var: &str, toml: Option<String>) -> Option<String> {
    cli.or_else(|| {
        std::env::var(env_var)
            .ok()
            .filter(|value| !value.trim().is_empty())
    })
    .or(toml)
}

/// Resolve a path setting: CLI → ENV → TOML
pub fn resolve_path(cli: Option<PathBuf>, env_var: &str, toml: Option<PathBuf>) -> Option<PathBuf> {
    resolve_string(
        cli.map(|p| p.to_string_lossy().into_owned()),
        env_var,
        toml.map(|p| p.to_string_lossy().into_owned()),
    )
    .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_flag() {
        assert_eq!(parse_bool_flag("1"), Some(true));
        assert_eq!(parse_bool_flag(" Yes "), Some(true));
        assert_eq!(parse_bool_flag("off"), Some(false));
        assert_eq!(parse_bool_flag("FALSE"), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TomlConfig = toml::from_str("strict_unsolved_mode = true\n").unwrap();
        assert_eq!(config.strict_unsolved_mode, Some(true));
        assert!(config.input.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_cli_wins_over_everything() {
        assert!(resolve_bool(Some(true), "POSLOG_TEST_UNSET_FLAG", Some(false), false));
        assert_eq!(
            resolve_string(Some("ptb".into()), "POSLOG_TEST_UNSET_STR", Some("upos".into())),
            Some("ptb".to_string())
        );
    }
}
