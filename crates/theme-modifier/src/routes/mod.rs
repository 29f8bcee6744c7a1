//! HTTP route handlers for the theme modifier.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (database)
//!
//! # Storefront (CORS)
//! GET|OPTIONS /api/content     - HTML fragment
//! GET|OPTIONS /api/data        - JSON payload
//! GET  /static/sdk.js          - Storefront SDK
//!
//! # App proxy (Shopify /apps/sdk/*)
//! GET  /app-proxy/{*path}
//! POST /app-proxy/{*path}
//!
//! # Install
//! GET  /auth                   - Start OAuth
//! GET  /auth/callback          - Finish OAuth, register with API tester
//!
//! # Embedded admin
//! GET  /app/themes             - List themes
//! POST /app/themes             - Theme file actions
//! ```

pub mod app_proxy;
pub mod app_themes;
pub mod auth;
pub mod content;

use axum::{Router, extract::State, http::StatusCode, middleware, routing::get};
use tower_http::services::ServeDir;

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create all routes for the theme modifier.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/content",
            get(content::content).options(content::preflight),
        )
        .route("/api/data", get(content::data).options(content::preflight))
        .route(
            "/app-proxy/{*path}",
            get(app_proxy::handle_get).post(app_proxy::handle_post),
        )
        .route("/auth", get(auth::install))
        .route("/auth/callback", get(auth::callback))
        .route(
            "/app/themes",
            get(app_themes::list).post(app_themes::action),
        )
}

/// Full application with health checks, static assets and middleware.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new("crates/theme-modifier/static"))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the session database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
