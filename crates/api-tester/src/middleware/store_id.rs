//! `X-Store-Id` extractor for the Shopify proxy endpoints.

use axum::{extract::FromRequestParts, http::request::Parts};

use api_tester_core::StoreCredentialId;

use crate::error::AppError;

/// Header carrying the credential id the proxy should act as.
pub const STORE_ID_HEADER: &str = "x-store-id";

/// Extracted `X-Store-Id`.
///
/// A missing or empty header is rejected with 400 before any lookup. A value
/// that is not a credential id yields `None` so the handler answers 404 just
/// like an unknown id.
#[derive(Debug, Clone, Copy)]
pub struct StoreIdHeader(pub Option<StoreCredentialId>);

impl<S> FromRequestParts<S> for StoreIdHeader
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(STORE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing X-Store-Id header".to_string()))?;

        Ok(Self(StoreCredentialId::parse(raw).ok()))
    }
}
