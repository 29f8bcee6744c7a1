//! Shopify app install (OAuth authorization code grant, offline access).
//!
//! ```text
//! GET /auth?shop=          - Issue a state nonce and redirect to Shopify
//! GET /auth/callback       - Verify, exchange, persist, register, redirect
//! ```
//!
//! Registration with the API tester is best effort: the install succeeds
//! even when the API tester is down.

use api_tester_core::{ShopDomain, SourceSession};
use axum::{
    extract::{Query, RawQuery, State},
    response::Redirect,
};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequestId;
use crate::shopify::verify_oauth_hmac;
use crate::state::AppState;

const STATE_NONCE_LEN: usize = 32;

#[derive(Debug, Deserialize)]
pub struct InstallQuery {
    pub shop: Option<String>,
}

/// Query parameters Shopify appends to the redirect.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub shop: Option<String>,
    pub state: Option<String>,
    /// Base64 `admin.shopify.com/store/{handle}`
    pub host: Option<String>,
}

fn parse_shop(raw: Option<&str>) -> Result<ShopDomain, AppError> {
    let raw = raw.ok_or_else(|| AppError::BadRequest("Missing shop parameter".to_string()))?;
    ShopDomain::parse(raw).map_err(|e| AppError::BadRequest(format!("Invalid shop: {e}")))
}

fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Admin URL of the embedded app, from the base64 `host` parameter.
///
/// Only Shopify admin hosts are accepted so the callback can't be turned
/// into an open redirect.
fn embedded_app_url(host: &str, api_key: &str) -> Option<String> {
    let bytes = STANDARD
        .decode(host)
        .or_else(|_| STANDARD_NO_PAD.decode(host))
        .ok()?;
    let decoded = String::from_utf8(bytes).ok()?;
    let authority = decoded.split('/').next()?;

    let trusted = authority == "admin.shopify.com" || authority.ends_with(".myshopify.com");
    (trusted && !decoded.contains("://")).then(|| format!("https://{decoded}/apps/{api_key}"))
}

/// Start an install.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if `shop` is missing or not a
/// `*.myshopify.com` domain.
#[instrument(skip(state))]
pub async fn install(
    State(state): State<AppState>,
    Query(query): Query<InstallQuery>,
) -> Result<Redirect, AppError> {
    let shop = parse_shop(query.shop.as_deref())?;
    let nonce = generate_nonce();

    let url = state
        .oauth()
        .authorization_url(&shop, &nonce, &state.config().oauth_callback_url());
    state.remember_oauth_state(nonce, shop.clone()).await;

    tracing::info!(shop = %shop, "Redirecting to Shopify for install");
    Ok(Redirect::to(&url))
}

/// Finish an install.
///
/// # Errors
///
/// - `AppError::Unauthorized` for a bad `hmac` or an unknown, expired or
///   mismatched `state`
/// - `AppError::BadRequest` for a missing `code` or bad `shop`
/// - `AppError::OAuth` if Shopify rejects the code
/// - `AppError::Database` if the session can't be stored
#[instrument(skip(state, query, raw_query, request_id), fields(shop))]
pub async fn callback(
    State(state): State<AppState>,
    request_id: RequestId,
    Query(query): Query<CallbackQuery>,
    RawQuery(raw_query): RawQuery,
) -> Result<Redirect, AppError> {
    if !verify_oauth_hmac(raw_query.as_deref().unwrap_or_default(), state.oauth().api_secret()) {
        tracing::warn!("OAuth callback with missing or invalid hmac");
        return Err(AppError::Unauthorized("Invalid HMAC signature".to_string()));
    }

    let shop = parse_shop(query.shop.as_deref())?;
    tracing::Span::current().record("shop", shop.as_str());

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing code parameter".to_string()))?;
    let nonce = query.state.unwrap_or_default();

    match state.take_oauth_state(&nonce).await {
        Some(issued_for) if issued_for == shop => {}
        _ => {
            tracing::warn!("OAuth state unknown, expired or issued for another shop");
            return Err(AppError::Unauthorized(
                "Invalid or expired OAuth state".to_string(),
            ));
        }
    }

    let token = state.oauth().exchange_code(&shop, &code).await?;

    let session = SourceSession {
        id: shop.offline_session_id(),
        shop: shop.to_string(),
        access_token: token.access_token,
        scope: Some(token.scope),
        is_online: false,
        expires: None,
    };
    state.sessions().store(&session, &nonce).await?;
    tracing::info!(session_id = %session.id, "Offline session stored");

    let scopes = session.scope.as_deref().unwrap_or_default();
    match state
        .api_tester()
        .register(
            session.shop.as_str(),
            &session.access_token,
            scopes,
            &state.config().shopify.api_version,
            Some(request_id.as_str()),
        )
        .await
    {
        Ok(response) => {
            tracing::info!(credential_id = %response.id, "Registered with API tester");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                endpoint = state.api_tester().endpoint(),
                "API tester registration failed; install continues"
            );
        }
    }

    let target = query
        .host
        .as_deref()
        .and_then(|host| embedded_app_url(host, &state.config().shopify.api_key))
        .unwrap_or_else(|| state.config().app_url.clone());

    Ok(Redirect::to(&target))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_shape() {
        let a = generate_nonce();
        assert_eq!(a.len(), STATE_NONCE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, generate_nonce());
    }

    #[test]
    fn test_embedded_app_url() {
        let host = STANDARD.encode("admin.shopify.com/store/my-shop");
        assert_eq!(
            embedded_app_url(&host, "key123").unwrap(),
            "https://admin.shopify.com/store/my-shop/apps/key123"
        );

        let unpadded = STANDARD_NO_PAD.encode("my-shop.myshopify.com/admin");
        assert_eq!(
            embedded_app_url(&unpadded, "key123").unwrap(),
            "https://my-shop.myshopify.com/admin/apps/key123"
        );
    }

    #[test]
    fn test_embedded_app_url_rejects_foreign_hosts() {
        assert!(embedded_app_url(&STANDARD.encode("evil.com/store/x"), "k").is_none());
        assert!(embedded_app_url("%%%not-base64", "k").is_none());
    }

    #[test]
    fn test_parse_shop() {
        assert!(matches!(parse_shop(None), Err(AppError::BadRequest(_))));
        assert!(matches!(
            parse_shop(Some("example.com")),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(
            parse_shop(Some("my-shop.myshopify.com")).unwrap().as_str(),
            "my-shop.myshopify.com"
        );
    }
}
