//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `QKART_API_ENDPOINT` - Backend base URL (default: `http://localhost:8082/api/v1`)
//! - `QKART_SESSION_FILE` - Where the session is persisted
//!   (default: `<data dir>/qkart/session.json`)
//! - `QKART_SEARCH_DEBOUNCE_MS` - Search debounce delay, 300-1000 (default: 500)
//! - `QKART_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `QKART_HTTP_TIMEOUT_SECS` - Per-request timeout (default: none, reqwest's default)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_ENDPOINT: &str = "http://localhost:8082/api/v1";
const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Accepted range for the search debounce delay, in milliseconds.
pub const DEBOUNCE_RANGE_MS: std::ops::RangeInclusive<u64> = 300..=1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST backend configuration
    pub api: ApiConfig,
    /// Path of the persisted session file
    pub session_file: PathBuf,
    /// Quiet period before a search is issued
    pub search_debounce: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// REST backend configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8082/api/v1`
    pub endpoint: Url,
    /// Optional per-request timeout
    pub timeout: Option<Duration>,
    /// How long catalog and search responses stay cached
    pub cache_ttl: Duration,
}

impl ApiConfig {
    /// Configuration for a backend at `endpoint` with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `endpoint` is not an absolute URL.
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint("QKART_API_ENDPOINT", endpoint)?,
            timeout: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        })
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if no
    /// session file is configured and the platform has no data directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig::from_env()?;

        let session_file = match get_optional_env("QKART_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };

        let debounce_ms = get_parsed_env("QKART_SEARCH_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?;
        let search_debounce = validate_debounce(debounce_ms)?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api,
            session_file,
            search_debounce,
            sentry_dsn,
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = get_env_or_default("QKART_API_ENDPOINT", DEFAULT_API_ENDPOINT);
        let cache_ttl = get_parsed_env("QKART_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let timeout = get_optional_env("QKART_HTTP_TIMEOUT_SECS")
            .map(|value| parse_u64("QKART_HTTP_TIMEOUT_SECS", &value))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            endpoint: parse_endpoint("QKART_API_ENDPOINT", &endpoint)?,
            timeout,
            cache_ttl: Duration::from_secs(cache_ttl),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a numeric environment variable with a default value.
fn get_parsed_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| parse_u64(key, &value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the backend endpoint, dropping any trailing slash.
fn parse_endpoint(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim_end_matches('/'))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(url)
}

/// Check the debounce delay is within the accepted range.
fn validate_debounce(ms: u64) -> Result<Duration, ConfigError> {
    if !DEBOUNCE_RANGE_MS.contains(&ms) {
        return Err(ConfigError::InvalidEnvVar(
            "QKART_SEARCH_DEBOUNCE_MS".to_string(),
            format!(
                "must be between {} and {} (got {ms})",
                DEBOUNCE_RANGE_MS.start(),
                DEBOUNCE_RANGE_MS.end()
            ),
        ));
    }
    Ok(Duration::from_millis(ms))
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("qkart").join("session.json"))
        .ok_or_else(|| ConfigError::MissingEnvVar("QKART_SESSION_FILE".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_strips_trailing_slash() {
        let url = parse_endpoint("TEST", "http://localhost:8082/api/v1/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8082/api/v1");
    }

    #[test]
    fn test_parse_endpoint_rejects_relative() {
        let result = parse_endpoint("TEST", "api/v1");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_parse_endpoint_rejects_non_base() {
        let result = parse_endpoint("TEST", "mailto:shop@example.com");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_debounce_range() {
        assert!(validate_debounce(299).is_err());
        assert!(validate_debounce(1001).is_err());
        assert_eq!(validate_debounce(300).unwrap(), Duration::from_millis(300));
        assert_eq!(validate_debounce(1000).unwrap(), Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_u64_invalid() {
        let err = parse_u64("QKART_CACHE_TTL_SECS", "five").unwrap_err();
        assert!(err.to_string().contains("QKART_CACHE_TTL_SECS"));
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::new(DEFAULT_API_ENDPOINT).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.timeout.is_none());
    }
}
