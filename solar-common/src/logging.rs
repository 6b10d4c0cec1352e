//! Tracing subscriber setup shared by both binaries
//!
//! The subscriber goes in before configuration is loaded so config-file
//! messages are not lost. Once the `[logging]` level is known, the filter is
//! swapped in place.

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use crate::config::LoggingConfig;
use crate::{Error, Result};

/// Default filter directives when RUST_LOG is unset
///
/// The configured level applies to the workspace crates; `tower_http` follows
/// it so request traces appear at debug.
pub fn default_directives(level: &str) -> String {
    format!(
        "{level},solar_common={level},solar_relay={level},solar_review={level},tower_http={level}",
        level = level
    )
}

/// Handle to the installed subscriber's filter
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// True when RUST_LOG supplied the filter
    pub fn is_env_override(&self) -> bool {
        self.from_env
    }

    /// Switch to the configured level
    ///
    /// RUST_LOG, when set, keeps precedence and this is a no-op.
    pub fn apply(&self, logging: &LoggingConfig) -> Result<()> {
        if self.from_env {
            return Ok(());
        }
        let filter = configured_filter(&logging.level)?;
        self.filter
            .reload(filter)
            .map_err(|e| Error::Config(format!("failed to apply log level: {}", e)))
    }
}

fn configured_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(default_directives(level))
        .map_err(|e| Error::Config(format!("invalid log level '{}': {}", level, e)))
}

/// Install the global tracing subscriber at the default `info` level
///
/// Call [`LogHandle::apply`] once the configuration is resolved.
pub fn init_tracing() -> Result<LogHandle> {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (configured_filter(&LoggingConfig::default().level)?, false),
    };
    let (filter_layer, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Config(format!("tracing already initialized: {}", e)))?;

    Ok(LogHandle {
        filter: handle,
        from_env,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace_crates() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("solar_relay=debug"));
        assert!(directives.contains("tower_http=debug"));
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        assert!(configured_filter("info").is_ok());
        assert!(configured_filter("verbose").is_err());
    }
}
