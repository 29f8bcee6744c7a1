//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `API_TESTER_DATABASE_URL` (fallback `DATABASE_URL`) - credential store
//! - `THEME_MODIFIER_DATABASE_URL` - theme modifier `Session` table
//!
//! # Migration Files
//!
//! - API tester: `crates/api-tester/migrations/`
//! - Theme modifier: `crates/theme-modifier/migrations/`
//!
//! Both servers also apply their migrations on start.

use api_tester::config::ApiTesterConfig;
use secrecy::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] api_tester::config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run API tester database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database can't be opened or a migration
/// fails.
pub async fn api_tester() -> Result<(), MigrationError> {
    let config = ApiTesterConfig::from_env()?;

    tracing::info!("Connecting to API tester database...");
    let pool = api_tester::db::create_pool(&config.database_url).await?;

    tracing::info!("Running API tester migrations...");
    api_tester::db::run_migrations(&pool).await?;
    pool.close().await;

    tracing::info!("API tester migrations complete!");
    Ok(())
}

/// Run theme modifier database migrations.
///
/// Only the database URL is read, so the Shopify app credentials need not be
/// set.
///
/// # Errors
///
/// Returns `MigrationError` if the database can't be opened or a migration
/// fails.
pub async fn theme_modifier() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();
    let database_url = SecretString::from(
        std::env::var("THEME_MODIFIER_DATABASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(api_tester_core::theme_modifier_database_url),
    );

    tracing::info!("Connecting to theme modifier database...");
    let pool = theme_modifier::db::create_pool(&database_url).await?;

    tracing::info!("Running theme modifier migrations...");
    theme_modifier::db::run_migrations(&pool).await?;
    pool.close().await;

    tracing::info!("Theme modifier migrations complete!");
    Ok(())
}
