//! Server-rendered dashboard pages.
//!
//! ```text
//! GET  /                     - Active store summary
//! GET  /stores               - Credential list
//! GET  /stores/new           - Manual credential form
//! POST /stores/new           - Create from the form
//! POST /stores/{id}/activate - Make a credential the active one
//! POST /stores/{id}/delete   - Delete a credential
//! GET  /themes               - Theme browser (driven by /static/themes.js)
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use api_tester_core::{StoreCredentialId, StoreCredentialSummary};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::routes::stores::CreateStoreRequest;
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub active: Option<StoreCredentialSummary>,
    pub store_count: usize,
    pub app_count: usize,
}

#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub stores: Vec<StoreCredentialSummary>,
}

#[derive(Template, WebTemplate)]
#[template(path = "store_new.html")]
pub struct StoreNewTemplate {
    pub error: Option<String>,
    pub form: StoreForm,
}

#[derive(Template, WebTemplate)]
#[template(path = "themes.html")]
pub struct ThemesTemplate {
    pub active: Option<StoreCredentialSummary>,
    pub stores: Vec<StoreCredentialSummary>,
}

/// Form fields for `POST /stores/new`. Token fields are never echoed back.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoreForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub store_url: String,
    #[serde(default)]
    pub admin_api_token: String,
    #[serde(default)]
    pub storefront_token: String,
    #[serde(default)]
    pub scopes: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub notes: String,
    /// Checkbox: present as `"on"` when ticked.
    pub is_active: Option<String>,
}

impl StoreForm {
    fn into_request(self) -> (CreateStoreRequest, Self) {
        let echo = Self {
            admin_api_token: String::new(),
            storefront_token: String::new(),
            ..self.clone()
        };
        let request = CreateStoreRequest {
            name: Some(self.name),
            store_url: Some(self.store_url),
            admin_api_token: Some(self.admin_api_token),
            storefront_token: Some(self.storefront_token),
            scopes: Some(self.scopes),
            api_version: Some(self.api_version),
            notes: Some(self.notes),
            is_active: self.is_active.is_some(),
        };
        (request, echo)
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>) -> Result<DashboardTemplate, AppError> {
    let stores = state.store_credentials().list().await?;
    let mut app_names: Vec<&str> = stores.iter().map(|s| s.name.as_str()).collect();
    app_names.sort_unstable();
    app_names.dedup();

    Ok(DashboardTemplate {
        active: stores
            .iter()
            .find(|s| s.is_active)
            .map(StoreCredentialSummary::from),
        store_count: stores.len(),
        app_count: app_names.len(),
    })
}

#[instrument(skip(state))]
pub async fn stores(State(state): State<AppState>) -> Result<StoresTemplate, AppError> {
    let stores = state.store_credentials().list().await?;
    Ok(StoresTemplate {
        stores: stores.iter().map(StoreCredentialSummary::from).collect(),
    })
}

pub async fn new_store_form() -> StoreNewTemplate {
    StoreNewTemplate {
        error: None,
        form: StoreForm {
            api_version: api_tester_core::DEFAULT_API_VERSION.to_string(),
            ..StoreForm::default()
        },
    }
}

/// Create from the form. Validation errors and conflicts re-render the form.
#[instrument(skip(state, form))]
pub async fn create_store(State(state): State<AppState>, Form(form): Form<StoreForm>) -> Response {
    let (request, echo) = form.into_request();

    let new = match request.into_new_credential() {
        Ok(new) => new,
        Err(e) => return rerender(StatusCode::BAD_REQUEST, e.to_string(), echo),
    };

    match state.store_credentials().create(&new).await {
        Ok(created) => {
            tracing::info!(id = %created.id, "Store credential created from dashboard");
            Redirect::to("/stores").into_response()
        }
        Err(RepositoryError::Conflict(_)) => rerender(
            StatusCode::CONFLICT,
            "A store with this name and URL already exists".to_string(),
            echo,
        ),
        Err(e) => AppError::from(e).into_response(),
    }
}

fn rerender(status: StatusCode, error: String, form: StoreForm) -> Response {
    (
        status,
        StoreNewTemplate {
            error: Some(error),
            form,
        },
    )
        .into_response()
}

#[instrument(skip(state))]
pub async fn activate_store(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = StoreCredentialId::parse(&id)
        .map_err(|_| AppError::NotFound("Store not found".to_string()))?;
    state.store_credentials().set_active(id).await?;
    Ok(Redirect::to("/stores"))
}

#[instrument(skip(state))]
pub async fn delete_store(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id = StoreCredentialId::parse(&id)
        .map_err(|_| AppError::NotFound("Store not found".to_string()))?;
    state.store_credentials().delete(id).await?;
    Ok(Redirect::to("/stores"))
}

#[instrument(skip(state))]
pub async fn themes(State(state): State<AppState>) -> Result<ThemesTemplate, AppError> {
    let stores = state.store_credentials().list().await?;
    let summaries: Vec<StoreCredentialSummary> =
        stores.iter().map(StoreCredentialSummary::from).collect();

    Ok(ThemesTemplate {
        active: summaries.iter().find(|s| s.is_active).cloned(),
        stores: summaries,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_echo_drops_tokens() {
        let form = StoreForm {
            name: "app".into(),
            store_url: "a.myshopify.com".into(),
            admin_api_token: "shpat_secret".into(),
            storefront_token: "sf_secret".into(),
            scopes: "read_themes".into(),
            api_version: String::new(),
            notes: String::new(),
            is_active: Some("on".into()),
        };
        let (request, echo) = form.into_request();
        assert!(echo.admin_api_token.is_empty());
        assert!(echo.storefront_token.is_empty());
        assert_eq!(echo.name, "app");
        assert!(request.is_active);
        let new = request.into_new_credential().unwrap();
        assert_eq!(new.api_version, "2025-01");
    }

    #[test]
    fn test_store_new_renders_error_banner() {
        let html = StoreNewTemplate {
            error: Some("Missing required fields".into()),
            form: StoreForm::default(),
        }
        .render()
        .unwrap();
        assert!(html.contains("Missing required fields"));
    }

    #[test]
    fn test_themes_page_offers_new_file_and_connection_test() {
        let html = ThemesTemplate {
            active: None,
            stores: vec![StoreCredentialSummary {
                id: StoreCredentialId::generate(),
                name: "app".into(),
                store_url: api_tester_core::StoreUrl::normalize("a.myshopify.com").unwrap(),
                scopes: "read_themes".into(),
                api_version: "2025-01".into(),
                is_active: true,
                notes: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            }],
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"id="new-file""#));
        assert!(html.contains(r#"id="new-filename""#));
        assert!(html.contains(r#"id="test-connection""#));
        assert!(html.contains(r#"id="sync-tokens""#));
        assert!(html.contains("a.myshopify.com"));
    }

    #[test]
    fn test_dashboard_without_active_store() {
        let html = DashboardTemplate {
            active: None,
            store_count: 0,
            app_count: 0,
        }
        .render()
        .unwrap();
        assert!(html.contains("No active store"));
    }
}
