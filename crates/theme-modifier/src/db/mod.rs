//! Database operations for the theme modifier `SQLite` file.
//!
//! ## Tables
//!
//! - `Session` - OAuth sessions, read directly by the API tester's sync
//!
//! # Migrations
//!
//! Migrations are stored in `crates/theme-modifier/migrations/`. They run at
//! server start and can be applied explicitly via:
//! ```bash
//! cargo run -p api-tester-cli -- migrate theme-modifier
//! ```

pub mod sessions;

use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use sessions::SessionRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create a `SQLite` connection pool, creating the file if needed.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

    let pool_options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options.connect_with(options).await
}

/// Apply embedded migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Fresh migrated in-memory database.
    #[allow(clippy::unwrap_used)]
    pub async fn pool() -> SqlitePool {
        let pool = create_pool(&SecretString::from("sqlite::memory:"))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }
}
