//! Theme modifier configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_API_KEY` - App client id
//! - `SHOPIFY_API_SECRET` - App client secret (high entropy, no placeholders)
//! - `SHOPIFY_APP_URL` - Public URL of this app (OAuth redirect base)
//!
//! ## Optional
//! - `THEME_MODIFIER_DATABASE_URL` - `SQLite` URL (default: `sqlite://theme-modifier.sqlite?mode=rwc`)
//! - `THEME_MODIFIER_HOST` - Bind address (default: 127.0.0.1)
//! - `THEME_MODIFIER_PORT` - Listen port (default: 3000)
//! - `SCOPES` - Comma separated OAuth scopes (default: `read_themes,write_themes`)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2025-01)
//! - `API_TESTER_URL` - Where to register credentials (default: `http://localhost:3100`)
//! - `APP_NAME` - Name registered with the API tester (default: `test-theme-modifier-app`)
//! - `APP_PROXY_VERIFY_SIGNATURE` - Require signed app proxy requests (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Environment name (e.g., production, staging)
//! - `SENTRY_SAMPLE_RATE` - Error sample rate 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate 0.0-1.0 (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use api_tester_core::{DEFAULT_API_VERSION, DEFAULT_APP_NAME, theme_modifier_database_url};
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Theme modifier application configuration.
#[derive(Debug, Clone)]
pub struct ThemeModifierConfig {
    /// `SQLite` URL for the `Session` table
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of this app, without trailing slash
    pub app_url: String,
    /// Shopify app credentials
    pub shopify: ShopifyAppConfig,
    /// Where OAuth tokens are pushed after install
    pub api_tester: ApiTesterLinkConfig,
    /// Reject app proxy requests without a valid `signature`
    pub app_proxy_verify_signature: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app credentials.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client id
    pub api_key: String,
    /// App client secret, signs OAuth callbacks and app proxy requests
    pub api_secret: SecretString,
    /// Requested OAuth scopes, comma separated
    pub scopes: String,
    /// Admin API version
    pub api_version: String,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// API tester registration target.
#[derive(Debug, Clone)]
pub struct ApiTesterLinkConfig {
    /// Base URL, without trailing slash
    pub url: String,
    /// `appName` sent with every registration
    pub app_name: String,
}

impl Default for ApiTesterLinkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3100".to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl ThemeModifierConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the app secret fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_env_or_default(
            "THEME_MODIFIER_DATABASE_URL",
            &theme_modifier_database_url(),
        ));
        let host = get_env_or_default("THEME_MODIFIER_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("THEME_MODIFIER_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("THEME_MODIFIER_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("THEME_MODIFIER_PORT".to_string(), e.to_string())
            })?;
        let app_url = get_required_env("SHOPIFY_APP_URL")?
            .trim_end_matches('/')
            .to_string();

        let shopify = ShopifyAppConfig::from_env()?;
        let api_tester = ApiTesterLinkConfig {
            url: get_env_or_default("API_TESTER_URL", "http://localhost:3100")
                .trim_end_matches('/')
                .to_string(),
            app_name: get_env_or_default("APP_NAME", DEFAULT_APP_NAME),
        };
        let app_proxy_verify_signature = parse_bool("APP_PROXY_VERIFY_SIGNATURE")?;

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
            app_url,
            shopify,
            api_tester,
            app_proxy_verify_signature,
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

    /// OAuth redirect target registered with Shopify.
    #[must_use]
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/auth/callback", self.app_url)
    }
}

impl ShopifyAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            scopes: get_env_or_default("SCOPES", "read_themes,write_themes"),
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required, non-empty environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// `true`/`1`/`yes` or `false`/`0`/`no`; unset is `false`.
fn parse_bool(key: &str) -> Result<bool, ConfigError> {
    match get_optional_env(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        None | Some("false" | "0" | "no") => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected true or false, got {other}"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the client secret from the Partner dashboard."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
