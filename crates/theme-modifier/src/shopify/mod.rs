//! Shopify app plumbing: OAuth install and request signatures.
//!
//! Admin GraphQL calls reuse `api_tester::shopify::AdminGraphqlClient` with
//! the shop's offline token.

pub mod oauth;
pub mod signature;

pub use oauth::{OAuthClient, OfflineToken};
pub use signature::{
    sign_oauth_params, sign_proxy_params, verify_oauth_hmac, verify_proxy_signature,
};

use thiserror::Error;

/// Errors from the OAuth token exchange.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify rejected the authorization code.
    #[error("Token exchange failed: HTTP {status}: {body}")]
    TokenExchange { status: u16, body: String },
}
