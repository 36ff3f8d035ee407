//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `POMELO_API_BASE_URL` - Base URL of the commerce backend
//!
//! ## Optional
//! - `POMELO_STORAGE_DIR` - Directory for the per-profile persistent store
//!   (default: `.pomelo`)
//! - `POMELO_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)
//! - `POMELO_CATALOG_TTL_SECS` - Product cache time-to-live (default: 300)
//! - `POMELO_CATALOG_CAPACITY` - Product cache capacity (default: 1024)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default time-to-live for cached products (5 minutes).
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(300);

/// Default product cache capacity.
pub const DEFAULT_CATALOG_CAPACITY: u64 = 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the commerce backend
    pub api_base_url: Url,
    /// Directory backing the per-profile persistent store
    pub storage_dir: PathBuf,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Time-to-live for cached products
    pub catalog_ttl: Duration,
    /// Maximum number of cached products
    pub catalog_capacity: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("POMELO_API_BASE_URL")?;
        let api_base_url = Url::parse(&api_base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("POMELO_API_BASE_URL".to_string(), e.to_string())
        })?;

        let storage_dir = PathBuf::from(get_env_or_default("POMELO_STORAGE_DIR", ".pomelo"));
        let request_timeout = get_duration_secs("POMELO_REQUEST_TIMEOUT_SECS", 10)?;
        let catalog_ttl =
            get_duration_secs("POMELO_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL.as_secs())?;
        let catalog_capacity = get_env_or_default(
            "POMELO_CATALOG_CAPACITY",
            &DEFAULT_CATALOG_CAPACITY.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("POMELO_CATALOG_CAPACITY".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_base_url,
            storage_dir,
            request_timeout,
            catalog_ttl,
            catalog_capacity,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable as a duration in whole seconds.
fn get_duration_secs(key: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    get_env_or_default(key, &default_secs.to_string())
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // Env mutation is process-wide, so every from_env case lives in one test.
    #[test]
    fn test_from_env() {
        // set_var is unsafe in edition 2024; the lone env test keeps it safe
        unsafe {
            std::env::set_var("POMELO_API_BASE_URL", "http://localhost:8080/api/");
            std::env::remove_var("POMELO_STORAGE_DIR");
            std::env::remove_var("POMELO_REQUEST_TIMEOUT_SECS");
            std::env::remove_var("POMELO_CATALOG_TTL_SECS");
            std::env::remove_var("POMELO_CATALOG_CAPACITY");
        }

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api/");
        assert_eq!(config.storage_dir, PathBuf::from(".pomelo"));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.catalog_ttl, DEFAULT_CATALOG_TTL);
        assert_eq!(config.catalog_capacity, DEFAULT_CATALOG_CAPACITY);

        unsafe {
            std::env::set_var("POMELO_API_BASE_URL", "not a url");
        }
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));

        unsafe {
            std::env::remove_var("POMELO_API_BASE_URL");
        }
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_get_duration_secs_default() {
        let duration = get_duration_secs("POMELO_NO_SUCH_VAR", 42).unwrap();
        assert_eq!(duration, Duration::from_secs(42));
    }
}
