//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::{DEFAULT_CATALOG_TIMEOUT, DEFAULT_COMPLETION_THRESHOLD_METERS, TrackerConfig};
use saga::DEFAULT_BLOG_TIMEOUT;
use thiserror::Error;

/// A configuration variable was set to an unusable value.
#[derive(Debug, Error)]
#[error("invalid value {value:?} for {var}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory stores when unset
/// - `BLOG_SERVICE_URL`: blog service base URL; in-memory likes when unset
/// - `TOURS_SERVICE_URL`: tours service base URL; in-memory catalog when unset
/// - `KEY_POINT_THRESHOLD_METERS`: key point radius (default: `50`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub blog_service_url: Option<String>,
    pub tours_service_url: Option<String>,
    pub key_point_threshold_meters: f64,
    pub blog_timeout: Duration,
    pub catalog_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match var("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError { var: "PORT", value })?,
            None => defaults.port,
        };

        let key_point_threshold_meters = match var("KEY_POINT_THRESHOLD_METERS") {
            Some(value) => match value.parse::<f64>() {
                Ok(meters) if meters.is_finite() && meters >= 0.0 => meters,
                _ => {
                    return Err(ConfigError {
                        var: "KEY_POINT_THRESHOLD_METERS",
                        value,
                    });
                }
            },
            None => defaults.key_point_threshold_meters,
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: var("DATABASE_URL"),
            blog_service_url: var("BLOG_SERVICE_URL"),
            tours_service_url: var("TOURS_SERVICE_URL"),
            key_point_threshold_meters,
            ..defaults
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            completion_threshold_meters: self.key_point_threshold_meters,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            blog_service_url: None,
            tours_service_url: None,
            key_point_threshold_meters: DEFAULT_COMPLETION_THRESHOLD_METERS,
            blog_timeout: DEFAULT_BLOG_TIMEOUT,
            catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
        }
    }
}
