//! Integration test harness for the API tester and theme modifier.
//!
//! Both apps are driven in-process with `tower::ServiceExt::oneshot` against
//! in-memory or temporary `SQLite` databases. Shopify is mocked with
//! `wiremock`; outbound clients are pointed at the mock via their origin
//! overrides.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p integration-tests
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use api_tester::config::{ApiTesterConfig, SyncConfig};
use api_tester::shopify::AdminGraphqlClient;
use theme_modifier::config::{ApiTesterLinkConfig, ShopifyAppConfig, ThemeModifierConfig};

/// App secret used to sign OAuth callbacks and app proxy requests in tests.
pub const TEST_SECRET: &str = "3f9c1a7be2d84c60a5e1f7b9d2c4e8a1";
pub const TEST_API_KEY: &str = "key123";
pub const TEST_SHOP: &str = "my-shop.myshopify.com";

// =============================================================================
// HTTP
// =============================================================================

/// Decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `Location` header of a redirect.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing.
    #[must_use]
    pub fn location(&self) -> &str {
        self.headers
            .get("location")
            .and_then(|v| v.to_str().ok())
            .expect("missing location header")
    }
}

/// Send one request through a router.
///
/// # Panics
///
/// Panics if the request can't be built or the body can't be read.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    json: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match json {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("valid request"))
        .await
        .expect("infallible router");

    let status = response.status();
    let headers = response.headers().clone();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Serve a router on an ephemeral local port.
///
/// # Panics
///
/// Panics if no port can be bound.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

// =============================================================================
// API tester
// =============================================================================

/// API tester configuration reading sessions from `sync_source`.
#[must_use]
pub fn api_tester_config(sync_source: PathBuf) -> ApiTesterConfig {
    ApiTesterConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3100,
        sync: SyncConfig {
            source_database: sync_source,
            app_name: api_tester_core::DEFAULT_APP_NAME.to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.1,
    }
}

/// API tester over a fresh in-memory credential store. Admin API calls go
/// over plain HTTP so stores can point at a mock server.
///
/// # Panics
///
/// Panics if the database can't be created.
pub async fn api_tester_app(config: ApiTesterConfig) -> (Router, api_tester::state::AppState) {
    let pool = api_tester::db::create_pool(&config.database_url)
        .await
        .expect("api tester pool");
    api_tester::db::run_migrations(&pool)
        .await
        .expect("api tester migrations");

    let shopify = AdminGraphqlClient::new(reqwest::Client::new()).with_scheme("http");
    let state = api_tester::state::AppState::new(config, pool, shopify);
    (api_tester::routes::app(state.clone()), state)
}

// =============================================================================
// Theme modifier
// =============================================================================

/// Theme modifier configuration registering with `api_tester_url`.
#[must_use]
pub fn theme_modifier_config(api_tester_url: &str) -> ThemeModifierConfig {
    ThemeModifierConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        app_url: "https://modifier.example.dev".to_string(),
        shopify: ShopifyAppConfig {
            api_key: TEST_API_KEY.to_string(),
            api_secret: SecretString::from(TEST_SECRET),
            scopes: "read_themes,write_themes".to_string(),
            api_version: api_tester_core::DEFAULT_API_VERSION.to_string(),
        },
        api_tester: ApiTesterLinkConfig {
            url: api_tester_url.to_string(),
            ..ApiTesterLinkConfig::default()
        },
        app_proxy_verify_signature: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.1,
    }
}

/// Create and migrate a theme modifier session database.
///
/// # Panics
///
/// Panics if the database can't be created.
pub async fn theme_modifier_pool(database_url: &str) -> SqlitePool {
    let pool = theme_modifier::db::create_pool(&SecretString::from(database_url))
        .await
        .expect("theme modifier pool");
    theme_modifier::db::run_migrations(&pool)
        .await
        .expect("theme modifier migrations");
    pool
}

/// Theme modifier whose Shopify calls (token exchange and Admin API) go to
/// `shopify_origin`.
///
/// # Panics
///
/// Panics if the database can't be created or the origin is unusable.
pub async fn theme_modifier_app(
    config: ThemeModifierConfig,
    shopify_origin: &str,
) -> (Router, theme_modifier::state::AppState) {
    use theme_modifier::services::ApiTesterClient;
    use theme_modifier::shopify::OAuthClient;
    use theme_modifier::state::{AppState, Clients};

    let pool = theme_modifier_pool("sqlite::memory:").await;
    let http = reqwest::Client::new();
    let clients = Clients {
        oauth: OAuthClient::new(http.clone(), &config.shopify).with_origin(shopify_origin),
        admin: AdminGraphqlClient::new(http.clone()).with_scheme("http"),
        api_tester: ApiTesterClient::new(http, &config.api_tester),
        admin_host: Some(
            api_tester_core::StoreUrl::normalize(shopify_origin).expect("mock origin"),
        ),
    };
    let state = AppState::with_clients(config, pool, clients);
    (theme_modifier::routes::app(state.clone()), state)
}
