//! API tester configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `API_TESTER_DATABASE_URL` - `SQLite` connection string
//!   (default: `sqlite://api-tester.sqlite?mode=rwc`, falls back to `DATABASE_URL`)
//! - `API_TESTER_HOST` - Bind address (default: 127.0.0.1)
//! - `API_TESTER_PORT` - Listen port (default: 3100)
//! - `SYNC_SOURCE_DATABASE` - Path to the theme modifier's `SQLite` file
//!   (default: `theme-modifier.sqlite`, the theme modifier's default database)
//! - `SYNC_APP_NAME` - Credential name used for imported sessions
//!   (default: `test-theme-modifier-app`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use api_tester_core::{DEFAULT_APP_NAME, THEME_MODIFIER_DATABASE_FILE};
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://api-tester.sqlite?mode=rwc";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API tester application configuration.
#[derive(Debug, Clone)]
pub struct ApiTesterConfig {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Session import settings
    pub sync: SyncConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Where `POST /api/sync-token` reads sessions from.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Theme modifier `SQLite` file, opened read-only
    pub source_database: PathBuf,
    /// Credential name imported rows are stored under
    pub app_name: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_database: PathBuf::from(THEME_MODIFIER_DATABASE_FILE),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl ApiTesterConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("API_TESTER_DATABASE_URL");
        let host = get_env_or_default("API_TESTER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_TESTER_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("API_TESTER_PORT", "3100")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_TESTER_PORT".to_string(), e.to_string()))?;
        let sync = SyncConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            sync,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl SyncConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let app_name = get_env_or_default("SYNC_APP_NAME", DEFAULT_APP_NAME);
        if app_name.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "SYNC_APP_NAME".to_string(),
                "must not be empty".to_string(),
            ));
        }
        Ok(Self {
            source_database: PathBuf::from(get_env_or_default(
                "SYNC_SOURCE_DATABASE",
                THEME_MODIFIER_DATABASE_FILE,
            )),
            app_name,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`, then the local file default.
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(
            |_| SecretString::from(DEFAULT_DATABASE_URL),
            SecretString::from,
        )
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
