//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use api_tester::shopify::{AdminGraphqlClient, StoreTarget};
use api_tester_core::{ShopDomain, SourceSession, StoreUrl};
use moka::future::Cache;
use sqlx::SqlitePool;

use crate::config::ThemeModifierConfig;
use crate::db::SessionRepository;
use crate::services::ApiTesterClient;
use crate::shopify::OAuthClient;

/// How long an OAuth `state` nonce stays valid.
const OAUTH_STATE_TTL: Duration = Duration::from_secs(600);
const OAUTH_STATE_CAPACITY: u64 = 10_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ThemeModifierConfig,
    pool: SqlitePool,
    clients: Clients,
    /// nonce -> shop it was issued for
    oauth_states: Cache<String, ShopDomain>,
}

/// Outbound HTTP clients.
#[derive(Clone)]
pub struct Clients {
    pub oauth: OAuthClient,
    pub admin: AdminGraphqlClient,
    pub api_tester: ApiTesterClient,
    /// Send Admin API calls here instead of the shop's own domain.
    pub admin_host: Option<StoreUrl>,
}

impl Clients {
    /// Production clients sharing one `reqwest::Client`.
    #[must_use]
    pub fn new(http: &reqwest::Client, config: &ThemeModifierConfig) -> Self {
        Self {
            oauth: OAuthClient::new(http.clone(), &config.shopify),
            admin: AdminGraphqlClient::new(http.clone()),
            api_tester: ApiTesterClient::new(http.clone(), &config.api_tester),
            admin_host: None,
        }
    }
}

impl AppState {
    /// Create a new application state.
    ///
    /// All outbound clients share `http`.
    #[must_use]
    pub fn new(config: ThemeModifierConfig, pool: SqlitePool, http: &reqwest::Client) -> Self {
        let clients = Clients::new(http, &config);
        Self::with_clients(config, pool, clients)
    }

    /// Create state from pre-built clients, e.g. pointed at mock servers.
    #[must_use]
    pub fn with_clients(config: ThemeModifierConfig, pool: SqlitePool, clients: Clients) -> Self {
        let oauth_states = Cache::builder()
            .max_capacity(OAUTH_STATE_CAPACITY)
            .time_to_live(OAUTH_STATE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                clients,
                oauth_states,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ThemeModifierConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Repository over the shared pool.
    #[must_use]
    pub fn sessions(&self) -> SessionRepository<'_> {
        SessionRepository::new(&self.inner.pool)
    }

    /// Shopify OAuth client.
    #[must_use]
    pub fn oauth(&self) -> &OAuthClient {
        &self.inner.clients.oauth
    }

    /// Admin GraphQL client, used with a shop's offline token.
    #[must_use]
    pub fn admin(&self) -> &AdminGraphqlClient {
        &self.inner.clients.admin
    }

    /// Admin API target for a stored session.
    #[must_use]
    pub fn store_target(&self, session: &SourceSession) -> StoreTarget {
        let store_url = self
            .inner
            .clients
            .admin_host
            .clone()
            .unwrap_or_else(|| StoreUrl::from_trusted(session.shop.clone()));

        StoreTarget {
            store_url,
            access_token: session.access_token.clone(),
            api_version: self.inner.config.shopify.api_version.clone(),
        }
    }

    /// Registration client for the API tester.
    #[must_use]
    pub fn api_tester(&self) -> &ApiTesterClient {
        &self.inner.clients.api_tester
    }

    /// Remember a freshly issued OAuth nonce.
    pub async fn remember_oauth_state(&self, nonce: String, shop: ShopDomain) {
        self.inner.oauth_states.insert(nonce, shop).await;
    }

    /// Consume a nonce. Returns the shop it was issued for, at most once.
    pub async fn take_oauth_state(&self, nonce: &str) -> Option<ShopDomain> {
        self.inner.oauth_states.remove(nonce).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use secrecy::SecretString;

    use super::*;
    use crate::config::{ApiTesterLinkConfig, ShopifyAppConfig};

    pub const TEST_SECRET: &str = "3f9c1a7be2d84c60a5e1f7b9d2c4e8a1";

    pub fn config() -> ThemeModifierConfig {
        ThemeModifierConfig {
            database_url: SecretString::from("sqlite::memory:"),
            host: std::net::IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            app_url: "https://modifier.example.dev".to_string(),
            shopify: ShopifyAppConfig {
                api_key: "key123".to_string(),
                api_secret: SecretString::from(TEST_SECRET),
                scopes: "read_themes,write_themes".to_string(),
                api_version: "2025-01".to_string(),
            },
            api_tester: ApiTesterLinkConfig::default(),
            app_proxy_verify_signature: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    /// State over a migrated in-memory database with default clients.
    pub async fn state(config: ThemeModifierConfig) -> AppState {
        let pool = crate::db::testing::pool().await;
        AppState::new(config, pool, &reqwest::Client::new())
    }
}
