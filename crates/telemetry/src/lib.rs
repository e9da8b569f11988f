//! Structured logging for the rewards API tooling
//!
//! Installs a global `tracing` subscriber with an `EnvFilter` and either a
//! compact or a JSON formatter. Log lines go to stderr so command output on
//! stdout stays machine-readable. `RUST_LOG` always wins over the configured
//! level.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging with the default configuration
pub fn init() -> anyhow::Result<()> {
    init_with_config(&TelemetryConfig::default())
}

/// Initialize logging with custom configuration
///
/// Fails if a global subscriber is already installed.
pub fn init_with_config(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow::anyhow!("Invalid log filter {:?}: {}", config.log_level, e))?;

    let (json, compact) = match config.format {
        LogFormat::Json => (
            Some(
                fmt::layer()
                    .json()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogFormat::Compact => (
            None,
            Some(
                fmt::layer()
                    .compact()
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(compact)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Logging initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human-readable output
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or `rewards_api_client=debug`
    pub log_level: String,
    /// Output format
    pub format: LogFormat,
    /// Include the event target (module path)
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            format: LogFormat::Compact,
            show_target: false,
        }
    }
}

impl TelemetryConfig {
    /// Debug-level logging for the client and the CLI
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            log_level: "rewards_api_client=debug,rewards_api=debug".to_string(),
            show_target: true,
            ..Self::default()
        }
    }

    /// Builder-style method to set the output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert_eq!(id, session_id());
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn test_verbose_config() {
        let config = TelemetryConfig::verbose().with_format(LogFormat::Json);
        assert!(config.log_level.contains("rewards_api_client=debug"));
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }

    #[test]
    fn test_second_init_fails() {
        assert!(init().is_ok());
        assert!(init().is_err());
    }
}
