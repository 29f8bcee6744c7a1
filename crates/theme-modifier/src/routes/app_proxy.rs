//! Shopify app proxy relay.
//!
//! Shopify forwards `https://{shop}/apps/sdk/*` to `/app-proxy/*`, so the
//! storefront can reach the app same-origin without CORS.
//!
//! ```text
//! GET  /app-proxy/content?variant=  - HTML fragment (proxy wording)
//! GET  /app-proxy/data?type=        - JSON payload tagged source=app-proxy
//! GET  /app-proxy/health            - {status, timestamp}
//! GET  /app-proxy/*                 - 404 {error, path}
//! POST /app-proxy/*                 - Echo {success, message, path, timestamp}
//! ```
//!
//! With `APP_PROXY_VERIFY_SIGNATURE=true` every request must carry a valid
//! `signature` query parameter.

use axum::{
    Json,
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::content::{Channel, ContentVariant, DataKind, data_payload, render_content};
use crate::error::AppError;
use crate::shopify::verify_proxy_signature;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub variant: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Reject unsigned requests when verification is enabled.
fn check_signature(state: &AppState, raw_query: Option<&str>) -> Result<(), AppError> {
    if !state.config().app_proxy_verify_signature {
        return Ok(());
    }

    if verify_proxy_signature(raw_query.unwrap_or_default(), state.oauth().api_secret()) {
        Ok(())
    } else {
        tracing::warn!("App proxy request with missing or invalid signature");
        Err(AppError::Unauthorized("Invalid signature".to_string()))
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[instrument(skip(state, query, raw_query))]
pub async fn handle_get(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<ProxyQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, AppError> {
    check_signature(&state, raw_query.as_deref())?;

    let now = Utc::now();
    let response = match path.as_str() {
        "content" => {
            let variant = ContentVariant::parse(query.variant.as_deref());
            let html = render_content(variant, Channel::AppProxy, now)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Html(html).into_response()
        }
        "data" => {
            let kind = DataKind::parse(query.kind.as_deref());
            Json(data_payload(kind, Channel::AppProxy, now)).into_response()
        }
        "health" => Json(json!({ "status": "ok", "timestamp": timestamp() })).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not found", "path": path })),
        )
            .into_response(),
    };

    Ok(response)
}

#[instrument(skip(state, raw_query))]
pub async fn handle_post(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, AppError> {
    check_signature(&state, raw_query.as_deref())?;

    Ok(Json(json!({
        "success": true,
        "message": "POST received",
        "path": path,
        "timestamp": timestamp(),
    }))
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request},
    };
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::shopify::sign_proxy_params;
    use crate::state::testing;

    async fn app(verify: bool) -> Router {
        let mut config = testing::config();
        config.app_proxy_verify_signature = verify;
        let state = testing::state(config).await;
        Router::new()
            .route(
                "/app-proxy/{*path}",
                axum::routing::get(handle_get).post(handle_post),
            )
            .with_state(state)
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_routes_by_path() {
        let (status, body) = send(app(false).await, Method::GET, "/app-proxy/content").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("loaded via App Proxy"));

        let (_, body) = send(app(false).await, Method::GET, "/app-proxy/data?type=products").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["source"], "app-proxy");
        assert_eq!(json["type"], "products");

        let (_, body) = send(app(false).await, Method::GET, "/app-proxy/health").await;
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_with_path() {
        let (status, body) = send(app(false).await, Method::GET, "/app-proxy/nope/deeper").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Not found");
        assert_eq!(json["path"], "nope/deeper");
    }

    #[tokio::test]
    async fn test_post_echoes_path() {
        let (status, body) = send(app(false).await, Method::POST, "/app-proxy/anything").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "POST received");
        assert_eq!(json["path"], "anything");
    }

    #[tokio::test]
    async fn test_signature_enforced_when_enabled() {
        let (status, _) = send(
            app(true).await,
            Method::GET,
            "/app-proxy/health?shop=my-shop.myshopify.com",
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let secret = SecretString::from(testing::TEST_SECRET);
        let signature = sign_proxy_params(
            &[("shop", "my-shop.myshopify.com"), ("timestamp", "1700000000")],
            &secret,
        )
        .unwrap();
        let uri = format!(
            "/app-proxy/health?shop=my-shop.myshopify.com&timestamp=1700000000&signature={signature}"
        );
        let (status, _) = send(app(true).await, Method::GET, &uri).await;
        assert_eq!(status, StatusCode::OK);
    }
}
