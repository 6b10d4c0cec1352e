//! Configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command line and environment are merged by each binary's clap parser; this
//! module supplies the TOML layer and the defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming an explicit TOML file
pub const CONFIG_ENV_VAR: &str = "SOLAR_AUDIT_CONFIG";

pub const DEFAULT_RELAY_HOST: &str = "127.0.0.1";
pub const DEFAULT_RELAY_PORT: u16 = 5000;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Overall request body ceiling (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_RELAY_URL: &str = "http://localhost:5000";
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 180;

/// What the relay answers when the vision model fails
///
/// The TOML file and the command line share one parser, so both accept any
/// case and surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum FallbackMode {
    /// 200 with the canned positive verdict marked `fallback: true`
    #[default]
    Canned,
    /// 502 with the upstream error
    Report,
}

impl FallbackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackMode::Canned => "canned",
            FallbackMode::Report => "report",
        }
    }
}

impl FromStr for FallbackMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "canned" => Ok(FallbackMode::Canned),
            "report" => Ok(FallbackMode::Report),
            other => Err(Error::Config(format!(
                "unknown fallback mode '{}' (expected 'canned' or 'report')",
                other
            ))),
        }
    }
}

impl TryFrom<String> for FallbackMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for FallbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TOML configuration file
///
/// Every key is optional; a missing file behaves like an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub review: ReviewSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[relay]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelaySection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub fallback_mode: Option<FallbackMode>,
    pub max_body_bytes: Option<usize>,
    pub upstream_timeout_secs: Option<u64>,
}

/// `[review]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSection {
    pub relay_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[logging]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default TOML location: `<config_dir>/solar-audit/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("solar-audit").join("config.toml"))
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Load TOML configuration
///
/// An explicit path must exist and parse. Without one, the default location
/// is tried; if nothing is there the compiled defaults apply and a warning is
/// logged.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read TOML {} failed: {}", path.display(), e))
        })?;
        let config = parse_toml_config(&content)?;
        info!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Read TOML {} failed: {}", path.display(), e))
            })?;
            let config = parse_toml_config(&content)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "No config file at {}; using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory; using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// First of command line/environment, then TOML, then the compiled default
pub fn resolve<T>(cli_or_env: Option<T>, toml: Option<T>, default: T) -> T {
    cli_or_env.or(toml).unwrap_or(default)
}
