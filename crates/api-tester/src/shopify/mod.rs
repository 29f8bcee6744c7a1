//! Shopify Admin GraphQL client.
//!
//! # Architecture
//!
//! - One shared `reqwest::Client`; the target store, token and API version
//!   come from a stored credential on every call
//! - Request and response envelopes are `graphql_client`'s `QueryBody` and
//!   `Response<serde_json::Value>`; documents live in `api_tester_core::themes`
//! - No retries, no rate-limit handling, a single page per query
//!
//! # Example
//!
//! ```rust,ignore
//! use api_tester::shopify::{AdminGraphqlClient, StoreTarget};
//!
//! let client = AdminGraphqlClient::new(reqwest::Client::new());
//! let target = StoreTarget::from(&credential);
//! let themes = client.list_themes(&target).await?;
//! ```

mod themes;

use std::fmt;

use api_tester_core::themes::Document;
use api_tester_core::{StoreCredential, StoreUrl};
use graphql_client::{QueryBody, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed before a response arrived.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Top-level GraphQL `errors` array was non-empty.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<graphql_client::Error>),

    /// A mutation returned `userErrors`.
    #[error("User errors: {0}")]
    UserErrors(Value),
}

fn format_graphql_errors(errors: &[graphql_client::Error]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Store, token and API version to address one Admin API endpoint.
#[derive(Clone)]
pub struct StoreTarget {
    pub store_url: StoreUrl,
    pub access_token: SecretString,
    pub api_version: String,
}

impl fmt::Debug for StoreTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreTarget")
            .field("store_url", &self.store_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl From<&StoreCredential> for StoreTarget {
    fn from(credential: &StoreCredential) -> Self {
        Self {
            store_url: credential.store_url.clone(),
            access_token: credential.admin_api_token.clone(),
            api_version: credential.api_version.clone(),
        }
    }
}

/// Shopify Admin API GraphQL client.
///
/// Cheap to clone; the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct AdminGraphqlClient {
    http: reqwest::Client,
    scheme: &'static str,
}

impl AdminGraphqlClient {
    /// Create a client that talks HTTPS to `{store}/admin/api/...`.
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            scheme: "https",
        }
    }

    /// Override the URL scheme, e.g. `http` for a local mock server.
    #[must_use]
    pub const fn with_scheme(mut self, scheme: &'static str) -> Self {
        self.scheme = scheme;
        self
    }

    /// GraphQL endpoint for a store and API version.
    #[must_use]
    pub fn endpoint(&self, target: &StoreTarget) -> String {
        format!(
            "{}://{}/admin/api/{}/graphql.json",
            self.scheme, target.store_url, target.api_version
        )
    }

    /// Execute a document and return the raw `{data, errors}` envelope.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Status` for non-2xx responses and
    /// `ShopifyError::Http` if the request or body decoding fails.
    #[instrument(skip(self, target, variables), fields(store = %target.store_url, operation = document.operation_name))]
    pub async fn execute<V: Serialize + Send + Sync>(
        &self,
        target: &StoreTarget,
        document: Document,
        variables: V,
    ) -> Result<Response<Value>, ShopifyError> {
        let body = QueryBody {
            variables,
            query: document.query,
            operation_name: document.operation_name,
        };

        let response = self
            .http
            .post(self.endpoint(target))
            .header("X-Shopify-Access-Token", target.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Shopify returned an error status");
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Response<Value>>().await?)
    }

    /// Execute a document and unwrap `data`, failing on GraphQL errors.
    async fn query<V: Serialize + Send + Sync>(
        &self,
        target: &StoreTarget,
        document: Document,
        variables: V,
    ) -> Result<Value, ShopifyError> {
        let response = self.execute(target, document, variables).await?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL(errors));
        }

        Ok(response.data.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn target() -> StoreTarget {
        StoreTarget {
            store_url: StoreUrl::normalize("demo.myshopify.com").unwrap(),
            access_token: SecretString::from("shpat_abc"),
            api_version: "2025-01".to_string(),
        }
    }

    #[test]
    fn test_endpoint() {
        let client = AdminGraphqlClient::new(reqwest::Client::new());
        assert_eq!(
            client.endpoint(&target()),
            "https://demo.myshopify.com/admin/api/2025-01/graphql.json"
        );
        let client = client.with_scheme("http");
        assert!(client.endpoint(&target()).starts_with("http://"));
    }

    #[test]
    fn test_status_error_display() {
        let err = ShopifyError::Status {
            status: 401,
            body: "Invalid API key or access token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 401: Invalid API key or access token"
        );
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors: Vec<graphql_client::Error> = serde_json::from_value(serde_json::json!([
            {"message": "Field not found"},
            {"message": "Invalid ID"}
        ]))
        .unwrap();
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(err.to_string(), "GraphQL errors: Field not found; Invalid ID");
    }

    #[test]
    fn test_target_debug_redacts_token() {
        let debug_output = format!("{:?}", target());
        assert!(debug_output.contains("demo.myshopify.com"));
        assert!(!debug_output.contains("shpat_abc"));
    }
}
