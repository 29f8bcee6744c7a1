//! Unified error handling for the API tester.
//!
//! Every error renders as a JSON body `{"error": ..., "details"?: ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::sync::SyncError;
use crate::shopify::ShopifyError;

/// Application-level error type for the API tester.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Session import failed as a whole.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid input.
    #[error("{0}")]
    BadRequest(String),

    /// Uniqueness conflict.
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound)
            | Self::NotFound(_)
            | Self::Sync(SyncError::SourceMissing(_)) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::BadRequest(_)
            | Self::Shopify(ShopifyError::GraphQL(_) | ShopifyError::UserErrors(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_)
            | Self::Shopify(_)
            | Self::Sync(SyncError::Source(_))
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
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
            // Verbatim upstream message; the themes page matches "401" in it
            Self::Shopify(err) => json!({ "error": err.to_string() }),
            Self::Database(RepositoryError::NotFound) => json!({ "error": "Store not found" }),
            Self::Database(RepositoryError::Conflict(_)) => {
                json!({ "error": "A store with this name and URL already exists" })
            }
            Self::Database(_) | Self::Internal(_) | Self::Sync(SyncError::Source(_)) => {
                json!({ "error": "Internal server error" })
            }
            Self::Sync(err @ SyncError::SourceMissing(_)) => {
                json!({ "success": false, "error": err.to_string() })
            }
            Self::NotFound(message) | Self::BadRequest(message) | Self::Conflict(message) => {
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
                "API tester request error"
            );
        }

        (status, Json(self.body())).into_response()
    }
}
