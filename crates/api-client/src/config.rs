//! Configuration for the rewards API client
//!
//! Every network call in the application resolves its origin from here, so
//! there is exactly one place that reads the base URL from the environment.

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Base URL used when no environment variable is set (local dev backend)
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Environment variables consulted for the base URL, first one set wins
pub const BASE_URL_VARS: [&str; 2] = ["EXPO_PUBLIC_API_URL", "API_URL"];

/// Environment variable holding the request timeout in milliseconds
pub const TIMEOUT_VAR: &str = "API_TIMEOUT_MS";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin plus path prefix, e.g. `https://host/api`
    pub base_url: String,
    /// Request timeout applied when a call does not set its own
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    /// Value of the `User-Agent` header
    pub user_agent: String,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("rewards-api-client/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `EXPO_PUBLIC_API_URL` or `API_URL`: base URL (first one set wins)
    /// - `API_TIMEOUT_MS`: request timeout in milliseconds
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = BASE_URL_VARS
            .iter()
            .find_map(|key| lookup(*key).filter(|value| !value.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse()
                .map(Duration::from_millis)
                .map_err(|_| {
                    ApiError::config(format!("{TIMEOUT_VAR} must be an integer, got {raw:?}"))
                })?,
            None => DEFAULT_TIMEOUT,
        };

        let config = Self {
            base_url,
            timeout,
            user_agent: default_user_agent(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create development configuration (local backend)
    #[must_use]
    pub fn development() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: default_user_agent(),
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config("base_url must start with http:// or https://"));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000/api");
        assert_eq!(config.timeout, Duration::from_millis(30_000));
        assert!(config.user_agent.starts_with("rewards-api-client/"));
    }

    #[test]
    fn test_lookup_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_first_base_url_var_wins() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("EXPO_PUBLIC_API_URL", "https://primary.example.com/api"),
            ("API_URL", "https://secondary.example.com/api"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://primary.example.com/api");
    }

    #[test]
    fn test_second_base_url_var_used_as_fallback() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("EXPO_PUBLIC_API_URL", "  "),
            ("API_URL", "https://secondary.example.com/api"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://secondary.example.com/api");
    }

    #[test]
    fn test_timeout_from_lookup() {
        let config = ClientConfig::from_lookup(lookup_from(&[("API_TIMEOUT_MS", "1500")])).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(1500));

        let err =
            ClientConfig::from_lookup(lookup_from(&[("API_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_base_url("https://api.example.com/api")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "https://api.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::default().with_base_url("").validate().is_err());
        assert!(ClientConfig::default().with_base_url("ftp://host").validate().is_err());
        assert!(ClientConfig::default().with_timeout(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_serializes_timeout_as_millis() {
        let json = serde_json::to_value(ClientConfig::development()).unwrap();
        assert_eq!(json["timeout_ms"], 10_000);
        assert_eq!(json["base_url"], "http://localhost:3000/api");
    }
}
