//! Relay configuration
//!
//! Command line and environment come in through clap; the TOML `[relay]`
//! table and compiled defaults fill whatever is left unset.

use clap::Parser;
use solar_common::config::{
    resolve, FallbackMode, LoggingConfig, TomlConfig, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_GEMINI_MODEL, DEFAULT_MAX_BODY_BYTES, DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT,
    DEFAULT_UPSTREAM_TIMEOUT_SECS,
};
use solar_common::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for solar-relay
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "solar-relay")]
#[command(about = "Rooftop solar verification relay in front of the Gemini vision model")]
#[command(version)]
pub struct RelayArgs {
    /// TOML config file
    #[arg(short, long, env = "SOLAR_AUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "SOLAR_RELAY_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model identifier
    #[arg(long, env = "SOLAR_GEMINI_MODEL")]
    pub model: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "SOLAR_GEMINI_BASE_URL")]
    pub gemini_base_url: Option<String>,

    /// Answer to a failed analysis: "canned" or "report"
    #[arg(long, env = "SOLAR_FALLBACK_MODE")]
    pub fallback_mode: Option<String>,

    /// Request body ceiling in bytes
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    /// Vision model request timeout in seconds
    #[arg(long)]
    pub upstream_timeout_secs: Option<u64>,
}

/// Fully resolved relay settings
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub api_key: Option<String>,
    pub model: String,
    pub gemini_base_url: String,
    pub fallback_mode: FallbackMode,
    pub max_body_bytes: usize,
    pub upstream_timeout: Duration,
    pub logging: LoggingConfig,
}

impl RelayConfig {
    /// Merge arguments over the TOML file over compiled defaults
    pub fn resolve(args: &RelayArgs, toml: &TomlConfig) -> Result<Self> {
        let relay = &toml.relay;

        let host = resolve(
            args.host.clone(),
            relay.host.clone(),
            DEFAULT_RELAY_HOST.to_string(),
        );
        let port = resolve(args.port, relay.port, DEFAULT_RELAY_PORT);
        if port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        let bind_addr = SocketAddr::new(parse_host(&host)?, port);

        let fallback_mode = match args.fallback_mode.as_deref() {
            Some(mode) => mode.parse()?,
            None => relay.fallback_mode.unwrap_or_default(),
        };

        let gemini_base_url = resolve(
            args.gemini_base_url.clone(),
            relay.gemini_base_url.clone(),
            DEFAULT_GEMINI_BASE_URL.to_string(),
        );
        validate_base_url(&gemini_base_url)?;

        let model = resolve(
            args.model.clone(),
            relay.model.clone(),
            DEFAULT_GEMINI_MODEL.to_string(),
        );
        if model.trim().is_empty() {
            return Err(Error::Config("model must not be empty".to_string()));
        }

        let max_body_bytes = resolve(
            args.max_body_bytes,
            relay.max_body_bytes,
            DEFAULT_MAX_BODY_BYTES,
        );
        if max_body_bytes == 0 {
            return Err(Error::Config("max_body_bytes must be positive".to_string()));
        }

        let timeout_secs = resolve(
            args.upstream_timeout_secs,
            relay.upstream_timeout_secs,
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        );
        if timeout_secs == 0 {
            return Err(Error::Config(
                "upstream_timeout_secs must be positive".to_string(),
            ));
        }

        let api_key = args
            .api_key
            .clone()
            .or_else(|| relay.api_key.clone())
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            bind_addr,
            api_key,
            model,
            gemini_base_url,
            fallback_mode,
            max_body_bytes,
            upstream_timeout: Duration::from_secs(timeout_secs),
            logging: toml.logging.clone(),
        })
    }
}

fn parse_host(host: &str) -> Result<IpAddr> {
    if host.eq_ignore_ascii_case("localhost") {
        return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
    host.parse()
        .map_err(|_| Error::Config(format!("invalid bind host '{}'", host)))
}

fn validate_base_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| Error::Config(format!("invalid Gemini base URL '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Config(format!(
            "Gemini base URL must be http or https, got '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::resolve(&RelayArgs::default(), &TomlConfig::default()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.fallback_mode, FallbackMode::Canned);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.upstream_timeout, Duration::from_secs(120));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_localhost_host() {
        let args = RelayArgs {
            host: Some("localhost".to_string()),
            ..Default::default()
        };
        let config = RelayConfig::resolve(&args, &TomlConfig::default()).unwrap();
        assert!(config.bind_addr.ip().is_loopback());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            RelayArgs {
                port: Some(0),
                ..Default::default()
            },
            RelayArgs {
                host: Some("not a host".to_string()),
                ..Default::default()
            },
            RelayArgs {
                gemini_base_url: Some("ftp://example.com".to_string()),
                ..Default::default()
            },
            RelayArgs {
                fallback_mode: Some("silent".to_string()),
                ..Default::default()
            },
            RelayArgs {
                max_body_bytes: Some(0),
                ..Default::default()
            },
            RelayArgs {
                upstream_timeout_secs: Some(0),
                ..Default::default()
            },
        ];

        for args in cases {
            assert!(
                RelayConfig::resolve(&args, &TomlConfig::default()).is_err(),
                "expected rejection for {:?}",
                args
            );
        }
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let args = RelayArgs {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let config = RelayConfig::resolve(&args, &TomlConfig::default()).unwrap();
        assert!(config.api_key.is_none());
    }
}
