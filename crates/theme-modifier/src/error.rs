//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`; errors render as a JSON
//! body `{"error": ..., "details"?: ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use api_tester::shopify::ShopifyError;

use crate::db::RepositoryError;
use crate::shopify::OAuthError;

/// Application-level error type for the theme modifier.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Admin API call failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// OAuth code exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad signature, stale OAuth state or unknown shop.
    #[error("{0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_)
            | Self::Shopify(ShopifyError::GraphQL(_) | ShopifyError::UserErrors(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) | Self::Shopify(_) | Self::OAuth(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> Value {
        match self {
            Self::Shopify(ShopifyError::GraphQL(errors)) => {
                json!({ "error": "GraphQL errors", "details": errors })
            }
            Self::Shopify(ShopifyError::UserErrors(errors)) => {
                json!({ "error": "User errors", "details": errors })
            }
            Self::Shopify(err) => json!({ "error": err.to_string() }),
            Self::OAuth(err) => json!({ "error": err.to_string() }),
            Self::Database(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::NotFound(message) | Self::Unauthorized(message) | Self::BadRequest(message) => {
                json!({ "error": message })
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
