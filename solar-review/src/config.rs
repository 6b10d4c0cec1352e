//! Review client configuration

use clap::Args;
use solar_common::config::{
    resolve, LoggingConfig, TomlConfig, DEFAULT_CLIENT_TIMEOUT_SECS, DEFAULT_RELAY_URL,
};
use solar_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Connection options shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// TOML config file
    #[arg(short, long, global = true, env = "SOLAR_AUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Relay base URL
    #[arg(long, global = true, env = "SOLAR_RELAY_URL")]
    pub relay_url: Option<String>,

    /// Relay request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

/// Resolved review client settings
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub relay_url: String,
    pub timeout: Duration,
    pub logging: LoggingConfig,
}

impl ReviewConfig {
    pub fn resolve(args: &ConnectionArgs, toml: &TomlConfig) -> Result<Self> {
        let relay_url = resolve(
            args.relay_url.clone(),
            toml.review.relay_url.clone(),
            DEFAULT_RELAY_URL.to_string(),
        );
        if relay_url.trim().is_empty() {
            return Err(Error::Config("relay_url must not be empty".to_string()));
        }

        let timeout_secs = resolve(
            args.timeout_secs,
            toml.review.timeout_secs,
            DEFAULT_CLIENT_TIMEOUT_SECS,
        );
        if timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }

        Ok(Self {
            relay_url,
            timeout: Duration::from_secs(timeout_secs),
            logging: toml.logging.clone(),
        })
    }
}
