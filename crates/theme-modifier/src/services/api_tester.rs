//! API tester registration client.
//!
//! After a successful install the offline token is pushed to
//! `POST {API_TESTER_URL}/api/stores/register`. The API tester is a local
//! developer tool, so callers log failures and carry on.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::ApiTesterLinkConfig;
use crate::middleware::REQUEST_ID_HEADER;

/// Errors that can occur when registering with the API tester.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// HTTP request failed (usually: the API tester is not running).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API tester answered with a non-2xx status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    app_name: &'a str,
    store_url: &'a str,
    admin_api_token: &'a str,
    scopes: &'a str,
    api_version: &'a str,
}

/// Body of a successful registration.
#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub id: String,
    pub message: String,
}

/// Client for the API tester's registration endpoint.
#[derive(Clone)]
pub struct ApiTesterClient {
    http: reqwest::Client,
    endpoint: String,
    app_name: String,
}

impl ApiTesterClient {
    /// Create a client for the configured API tester.
    #[must_use]
    pub fn new(http: reqwest::Client, config: &ApiTesterLinkConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/stores/register", config.url),
            app_name: config.app_name.clone(),
        }
    }

    /// Registration endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upsert this app's credential for `shop`.
    ///
    /// `request_id` is forwarded as `x-request-id` so the API tester logs the
    /// registration under the same id as the OAuth callback.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::Http` if the API tester is unreachable and
    /// `RegistrationError::Api` if it rejects the request.
    #[instrument(skip(self, access_token), fields(app_name = %self.app_name))]
    pub async fn register(
        &self,
        shop: &str,
        access_token: &SecretString,
        scopes: &str,
        api_version: &str,
        request_id: Option<&str>,
    ) -> Result<RegisterResponse, RegistrationError> {
        let mut request = self.http.post(&self.endpoint);
        if let Some(id) = request_id {
            request = request.header(REQUEST_ID_HEADER, id);
        }

        let response = request
            .json(&RegisterRequest {
                app_name: &self.app_name,
                store_url: shop,
                admin_api_token: access_token.expose_secret(),
                scopes,
                api_version,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistrationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(url: &str) -> ApiTesterClient {
        ApiTesterClient::new(
            reqwest::Client::new(),
            &ApiTesterLinkConfig {
                url: url.to_string(),
                app_name: "test-theme-modifier-app".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_register_sends_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/stores/register"))
            .and(header("x-request-id", "req-1"))
            .and(body_json(serde_json::json!({
                "appName": "test-theme-modifier-app",
                "storeUrl": "my-shop.myshopify.com",
                "adminApiToken": "shpat_abc",
                "scopes": "read_themes",
                "apiVersion": "2025-01",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "id": "6f1c1c36-7f57-4f0e-9a55-4f7f0f7a1b2c",
                "message": "Credentials registered successfully",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server.uri())
            .register(
                "my-shop.myshopify.com",
                &SecretString::from("shpat_abc"),
                "read_themes",
                "2025-01",
                Some("req-1"),
            )
            .await
            .unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_register_surfaces_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Missing required fields"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .register("a.myshopify.com", &SecretString::from("t"), "", "2025-01", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_register_unreachable() {
        // Port 9 (discard) is never an HTTP server
        let err = client("http://127.0.0.1:9")
            .register("a.myshopify.com", &SecretString::from("t"), "", "2025-01", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Http(_)));
    }
}
