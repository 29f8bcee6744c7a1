//! HTTP route handlers for the API tester.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database)
//!
//! # Dashboard (HTML)
//! GET  /                       - Overview
//! GET  /stores                 - Credential list
//! GET  /stores/new             - New credential form
//! POST /stores/new             - Create credential
//! POST /stores/{id}/activate   - Make active
//! POST /stores/{id}/delete     - Delete
//! GET  /themes                 - Theme browser
//!
//! # Credential API
//! GET    /api/stores
//! POST   /api/stores
//! POST   /api/stores/register
//! GET    /api/stores/{id}
//! PUT    /api/stores/{id}
//! DELETE /api/stores/{id}
//! POST   /api/sync-token
//!
//! # Shopify proxy (X-Store-Id required)
//! GET    /api/shopify/shop
//! GET    /api/shopify/themes
//! GET    /api/shopify/themes/{themeId}
//! POST   /api/shopify/themes/{themeId}
//! DELETE /api/shopify/themes/{themeId}
//! GET    /api/shopify/themes/{themeId}/files
//! POST   /api/shopify/themes/{themeId}/files
//! DELETE /api/shopify/themes/{themeId}/files
//! ```

pub mod pages;
pub mod shopify;
pub mod stores;
pub mod sync;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Credential store routes, nested under `/api/stores`.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::list).post(stores::create))
        .route("/register", post(stores::register))
        .route(
            "/{id}",
            get(stores::show).put(stores::update).delete(stores::delete),
        )
}

/// Shopify proxy routes, nested under `/api/shopify`.
pub fn shopify_routes() -> Router<AppState> {
    Router::new()
        .route("/shop", get(shopify::shop))
        .route("/themes", get(shopify::themes))
        .route(
            "/themes/{theme_id}",
            get(shopify::theme_files)
                .post(shopify::upsert_file)
                .delete(shopify::delete_file),
        )
        .route(
            "/themes/{theme_id}/files",
            get(shopify::file_content)
                .post(shopify::upsert_file)
                .delete(shopify::delete_file),
        )
}

/// Dashboard pages.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::dashboard))
        .route("/stores", get(pages::stores))
        .route(
            "/stores/new",
            get(pages::new_store_form).post(pages::create_store),
        )
        .route("/stores/{id}/activate", post(pages::activate_store))
        .route("/stores/{id}/delete", post(pages::delete_store))
        .route("/themes", get(pages::themes))
}

/// Create all routes for the API tester.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(page_routes())
        .nest("/api/stores", store_routes())
        .route("/api/sync-token", post(sync::sync_token))
        .nest("/api/shopify", shopify_routes())
}

/// Full application with health checks, static assets and middleware.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new("crates/api-tester/static"))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
