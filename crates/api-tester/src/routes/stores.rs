//! Credential store JSON API.
//!
//! ```text
//! GET    /api/stores            - List credentials (no tokens)
//! POST   /api/stores            - Create a credential
//! GET    /api/stores/{id}       - One credential including tokens
//! PUT    /api/stores/{id}       - Partial update
//! DELETE /api/stores/{id}       - Delete
//! POST   /api/stores/register   - Upsert from a remote app
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::instrument;

use api_tester_core::{
    CredentialRegistration, DEFAULT_API_VERSION, NewStoreCredential, StoreCredentialDetail,
    StoreCredentialId, StoreCredentialPatch, StoreCredentialSummary, StoreUrl,
};

use crate::error::AppError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub name: Option<String>,
    pub store_url: Option<String>,
    pub admin_api_token: Option<String>,
    pub storefront_token: Option<String>,
    pub scopes: Option<String>,
    pub api_version: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub store_url: Option<String>,
    pub admin_api_token: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub storefront_token: Option<Option<String>>,
    pub scopes: Option<String>,
    pub api_version: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// Present-but-null becomes `Some(None)`; an absent field stays `None`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub app_name: Option<String>,
    pub store_url: Option<String>,
    pub admin_api_token: Option<String>,
    pub storefront_token: Option<String>,
    pub scopes: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub id: StoreCredentialId,
    pub message: &'static str,
}

/// Trimmed value, `None` when absent or blank.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_url(raw: &str) -> Result<StoreUrl, AppError> {
    StoreUrl::normalize(raw).map_err(|e| AppError::BadRequest(format!("Invalid storeUrl: {e}")))
}

/// Path ids that are not credential ids can never match a row.
fn parse_id(raw: &str) -> Result<StoreCredentialId, AppError> {
    StoreCredentialId::parse(raw).map_err(|_| AppError::NotFound("Store not found".to_string()))
}

impl CreateStoreRequest {
    /// Validate required fields and build the insert.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if a required field is missing or the
    /// store URL is unusable.
    pub fn into_new_credential(self) -> Result<NewStoreCredential, AppError> {
        let (Some(name), Some(store_url), Some(admin_api_token), Some(scopes)) = (
            non_empty(self.name),
            non_empty(self.store_url),
            non_empty(self.admin_api_token),
            non_empty(self.scopes),
        ) else {
            return Err(AppError::BadRequest(
                "Missing required fields: name, storeUrl, adminApiToken, scopes".to_string(),
            ));
        };

        Ok(NewStoreCredential {
            name,
            store_url: normalize_url(&store_url)?,
            admin_api_token: SecretString::from(admin_api_token),
            storefront_token: non_empty(self.storefront_token).map(SecretString::from),
            scopes,
            api_version: non_empty(self.api_version)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            notes: non_empty(self.notes),
            is_active: self.is_active,
        })
    }
}

impl UpdateStoreRequest {
    fn into_patch(self) -> Result<StoreCredentialPatch, AppError> {
        Ok(StoreCredentialPatch {
            name: self.name,
            store_url: self.store_url.as_deref().map(normalize_url).transpose()?,
            admin_api_token: self.admin_api_token.map(SecretString::from),
            storefront_token: self
                .storefront_token
                .map(|token| non_empty(token).map(SecretString::from)),
            scopes: self.scopes,
            api_version: self.api_version,
            notes: self.notes.map(non_empty),
            is_active: self.is_active,
        })
    }
}

impl RegisterRequest {
    fn into_registration(self) -> Result<CredentialRegistration, AppError> {
        let (Some(app_name), Some(store_url), Some(admin_api_token), Some(scopes)) = (
            non_empty(self.app_name),
            non_empty(self.store_url),
            non_empty(self.admin_api_token),
            non_empty(self.scopes),
        ) else {
            return Err(AppError::BadRequest(
                "Missing required fields: appName, storeUrl, adminApiToken, scopes".to_string(),
            ));
        };

        Ok(CredentialRegistration {
            app_name,
            store_url: normalize_url(&store_url)?,
            admin_api_token: SecretString::from(admin_api_token),
            storefront_token: non_empty(self.storefront_token).map(SecretString::from),
            scopes,
            api_version: Some(
                non_empty(self.api_version).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            ),
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List credentials, most recently updated first. Tokens are never included.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StoreCredentialSummary>>, AppError> {
    let stores = state.store_credentials().list().await?;
    Ok(Json(stores.iter().map(StoreCredentialSummary::from).collect()))
}

/// Create a credential. 409 when `(storeUrl, name)` already exists.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateStoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new = body.into_new_credential()?;
    let created = state.store_credentials().create(&new).await?;

    tracing::info!(id = %created.id, name = %created.name, store_url = %created.store_url, "Store credential created");

    Ok((StatusCode::CREATED, Json(created.reveal())))
}

/// One credential including its tokens.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoreCredentialDetail>, AppError> {
    let id = parse_id(&id)?;
    let store = state
        .store_credentials()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

    Ok(Json(store.reveal()))
}

/// Partial update. `isActive: true` deactivates every other row.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<StoreCredentialDetail>, AppError> {
    let id = parse_id(&id)?;
    let patch = body.into_patch()?;
    let updated = state.store_credentials().update(id, &patch).await?;

    Ok(Json(updated.reveal()))
}

/// Delete a credential.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_id(&id)?;
    state.store_credentials().delete(id).await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Upsert a credential pushed by a remote app, keyed on `(storeUrl, appName)`.
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let registration = body.into_registration()?;
    let outcome = state
        .store_credentials()
        .upsert_registration(&registration)
        .await?;

    tracing::info!(
        app_name = %registration.app_name,
        store_url = %registration.store_url,
        created = outcome.is_created(),
        "Store credential registered"
    );

    Ok(Json(RegisterResponse {
        success: true,
        id: outcome.id(),
        message: "Credentials registered successfully",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_create_requires_fields() {
        let req = CreateStoreRequest {
            name: Some("app".into()),
            store_url: Some("a.myshopify.com".into()),
            admin_api_token: Some("  ".into()),
            scopes: Some("read_themes".into()),
            ..Default::default()
        };
        let err = req.into_new_credential().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: name, storeUrl, adminApiToken, scopes"
        );
    }

    #[test]
    fn test_create_normalizes_and_defaults() {
        let req = CreateStoreRequest {
            name: Some("app".into()),
            store_url: Some("https://a.myshopify.com/".into()),
            admin_api_token: Some("shpat_x".into()),
            scopes: Some("read_themes".into()),
            ..Default::default()
        };
        let new = req.into_new_credential().unwrap();
        assert_eq!(new.store_url.as_str(), "a.myshopify.com");
        assert_eq!(new.api_version, "2025-01");
        assert!(new.storefront_token.is_none());
    }

    #[test]
    fn test_update_null_clears_and_absent_keeps() {
        let req: UpdateStoreRequest =
            serde_json::from_value(serde_json::json!({ "notes": null, "storefrontToken": "  " }))
                .unwrap();
        let patch = req.into_patch().unwrap();
        assert!(matches!(patch.notes, Some(None)));
        assert!(matches!(patch.storefront_token, Some(None)));

        let req: UpdateStoreRequest =
            serde_json::from_value(serde_json::json!({ "notes": "hello" })).unwrap();
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.notes, Some(Some("hello".to_string())));
        assert!(patch.storefront_token.is_none());
    }

    #[test]
    fn test_register_requires_fields() {
        let err = RegisterRequest::default().into_registration().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: appName, storeUrl, adminApiToken, scopes"
        );
    }

    #[test]
    fn test_register_version_defaults() {
        let req = RegisterRequest {
            app_name: Some("app".into()),
            store_url: Some("http://my-shop.myshopify.com/".into()),
            admin_api_token: Some("shpat_y".into()),
            scopes: Some("read_themes".into()),
            ..Default::default()
        };
        let reg = req.into_registration().unwrap();
        assert_eq!(reg.store_url.as_str(), "my-shop.myshopify.com");
        assert_eq!(reg.api_version.as_deref(), Some("2025-01"));
        assert_eq!(reg.admin_api_token.expose_secret(), "shpat_y");
    }

    #[test]
    fn test_update_patch_normalizes_url() {
        let req = UpdateStoreRequest {
            store_url: Some("https://b.myshopify.com/".into()),
            is_active: Some(true),
            ..Default::default()
        };
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.store_url.unwrap().as_str(), "b.myshopify.com");
        assert_eq!(patch.is_active, Some(true));
        assert!(patch.name.is_none());
    }
}
