//! Shopify app OAuth (authorization code grant, offline access mode).
//!
//! 1. Redirect the merchant to [`OAuthClient::authorization_url`]
//! 2. Shopify redirects back to `/auth/callback` with `code`, `shop`,
//!    `state`, `timestamp` and `hmac`
//! 3. Verify `hmac` and `state`, then [`OAuthClient::exchange_code`]

use api_tester_core::ShopDomain;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::OAuthError;
use crate::config::ShopifyAppConfig;

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    scope: String,
}

/// Token returned by the code exchange.
pub struct OfflineToken {
    pub access_token: SecretString,
    pub scope: String,
}

impl std::fmt::Debug for OfflineToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineToken")
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

/// OAuth client for one Shopify app.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
    scopes: String,
    origin_override: Option<String>,
}

impl OAuthClient {
    /// Create a client for the configured app.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &ShopifyAppConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            scopes: config.scopes.clone(),
            origin_override: None,
        }
    }

    /// Send token exchanges to `origin` instead of `https://{shop}`, e.g. a
    /// local mock server.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin_override = Some(origin.into().trim_end_matches('/').to_string());
        self
    }

    fn shop_origin(&self, shop: &ShopDomain) -> String {
        self.origin_override
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    /// App secret, used to verify callback and proxy signatures.
    #[must_use]
    pub const fn api_secret(&self) -> &SecretString {
        &self.api_secret
    }

    /// Authorization URL for an offline-access install.
    #[must_use]
    pub fn authorization_url(&self, shop: &ShopDomain, state: &str, redirect_uri: &str) -> String {
        format!(
            "https://{}/admin/oauth/authorize?\
            client_id={}&\
            scope={}&\
            redirect_uri={}&\
            state={}",
            shop,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.scopes),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for an offline access token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Http` if the request fails and
    /// `OAuthError::TokenExchange` if Shopify rejects the code.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<OfflineToken, OAuthError> {
        let url = format!("{}/admin/oauth/access_token", self.shop_origin(shop));

        let response = self
            .http
            .post(&url)
            .json(&TokenRequest {
                client_id: &self.api_key,
                client_secret: self.api_secret.expose_secret(),
                code,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;

        Ok(OfflineToken {
            access_token: SecretString::from(token.access_token),
            scope: token.scope,
        })
    }
}
