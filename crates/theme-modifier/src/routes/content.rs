//! Cross-origin content endpoints for the storefront SDK.
//!
//! ```text
//! GET     /api/content?variant=default|promo|announcement  - HTML fragment
//! GET     /api/data?type=general|products|config|stats      - JSON payload
//! OPTIONS /api/content, /api/data                           - CORS preflight
//! ```
//!
//! Any other method is answered with 405 by the router.

use axum::{
    Json,
    extract::Query,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL,
        },
    },
    response::{Html, IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::content::{Channel, ContentVariant, DataKind, data_payload, render_content};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub variant: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers
}

fn cacheable_cors_headers() -> HeaderMap {
    let mut headers = cors_headers();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=60"),
    );
    headers
}

/// HTML fragment for `[data-sdk-content]` containers.
///
/// # Errors
///
/// Returns `AppError::Internal` if the template fails to render.
pub async fn content(Query(query): Query<ContentQuery>) -> Result<Response, AppError> {
    let variant = ContentVariant::parse(query.variant.as_deref());
    let html = render_content(variant, Channel::Direct, Utc::now())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((cacheable_cors_headers(), Html(html)).into_response())
}

/// JSON payload for `data-sdk-type="json"` containers.
pub async fn data(Query(query): Query<DataQuery>) -> Response {
    let kind = DataKind::parse(query.kind.as_deref());
    let payload = data_payload(kind, Channel::Direct, Utc::now());

    (cacheable_cors_headers(), Json(payload)).into_response()
}

/// CORS preflight.
pub async fn preflight() -> Response {
    (StatusCode::NO_CONTENT, cors_headers()).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Method, Request},
        routing::get,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route("/api/content", get(content).options(preflight))
            .route("/api/data", get(data).options(preflight))
    }

    async fn send(method: Method, uri: &str) -> Response {
        app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_content_has_cors_and_cache_headers() {
        let response = send(Method::GET, "/api/content?variant=promo").await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=60");
        assert!(
            headers["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("app-content--promo"));
    }

    #[tokio::test]
    async fn test_data_type_param() {
        let response = send(Method::GET, "/api/data?type=config").await;
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["type"], "config");
        assert_eq!(json["settings"]["currency"], "USD");
    }

    #[tokio::test]
    async fn test_preflight_is_204() {
        let response = send(Method::OPTIONS, "/api/data").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }

    #[tokio::test]
    async fn test_other_methods_are_405() {
        let response = send(Method::POST, "/api/content").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
