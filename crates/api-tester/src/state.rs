//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ApiTesterConfig;
use crate::db::StoreCredentialRepository;
use crate::services::sync::SqliteSessionSource;
use crate::shopify::AdminGraphqlClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiTesterConfig,
    pool: SqlitePool,
    shopify: AdminGraphqlClient,
    session_source: SqliteSessionSource,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API tester configuration
    /// * `pool` - `SQLite` connection pool for the credential store
    /// * `shopify` - Admin GraphQL client
    #[must_use]
    pub fn new(config: ApiTesterConfig, pool: SqlitePool, shopify: AdminGraphqlClient) -> Self {
        let session_source = SqliteSessionSource::new(config.sync.source_database.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
                session_source,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ApiTesterConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Repository over the shared pool.
    #[must_use]
    pub fn store_credentials(&self) -> StoreCredentialRepository<'_> {
        StoreCredentialRepository::new(&self.inner.pool)
    }

    /// Get a reference to the Shopify Admin GraphQL client.
    #[must_use]
    pub fn shopify(&self) -> &AdminGraphqlClient {
        &self.inner.shopify
    }

    /// Session source for `POST /api/sync-token`.
    #[must_use]
    pub fn session_source(&self) -> &SqliteSessionSource {
        &self.inner.session_source
    }
}
