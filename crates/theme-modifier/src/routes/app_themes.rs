//! Theme editing API for the embedded admin page.
//!
//! Calls the Admin API with the shop's offline token.
//!
//! ```text
//! GET  /app/themes?shop=   - {themes: [...]}
//! POST /app/themes?shop=   - {actionType, themeId, filename?, content?}
//! ```
//!
//! `actionType` is one of `getFiles`, `upsertFile` or `deleteFile`. Mutation
//! `userErrors` come back as `{success: false, action, errors}` with 200.

use api_tester::shopify::{ShopifyError, StoreTarget};
use api_tester_core::ShopDomain;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub shop: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeActionRequest {
    pub action_type: String,
    pub theme_id: Option<String>,
    pub filename: Option<String>,
    pub content: Option<String>,
}

/// Offline-session target for `?shop=`.
async fn resolve_target(state: &AppState, shop: Option<&str>) -> Result<StoreTarget, AppError> {
    let shop = shop
        .ok_or_else(|| AppError::BadRequest("Missing shop parameter".to_string()))
        .and_then(|raw| {
            ShopDomain::parse(raw).map_err(|e| AppError::BadRequest(format!("Invalid shop: {e}")))
        })?;

    let session = state.sessions().find_offline(&shop).await?.ok_or_else(|| {
        AppError::Unauthorized(format!("No offline session for {shop}; install the app first"))
    })?;

    Ok(state.store_target(&session))
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {name}")))
}

/// Map a mutation result to the action envelope.
fn mutation_result(
    action: &str,
    result: Result<Value, ShopifyError>,
    payload_field: &str,
    files_field: &str,
    response_field: &str,
) -> Result<Json<Value>, AppError> {
    match result {
        Ok(data) => {
            let files = data
                .get(payload_field)
                .and_then(|p| p.get(files_field))
                .cloned()
                .unwrap_or(Value::Null);
            let mut body = Map::new();
            body.insert("success".to_string(), Value::Bool(true));
            body.insert("action".to_string(), json!(action));
            body.insert(response_field.to_string(), files);
            Ok(Json(Value::Object(body)))
        }
        Err(ShopifyError::UserErrors(errors)) => Ok(Json(json!({
            "success": false,
            "action": action,
            "errors": errors,
        }))),
        Err(err) => Err(err.into()),
    }
}

/// List the shop's themes.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the shop has no offline session, or a
/// Shopify error if the Admin API call fails.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Value>, AppError> {
    let target = resolve_target(&state, query.shop.as_deref()).await?;
    let data = state.admin().list_themes(&target).await?;

    let themes = data
        .pointer("/themes/nodes")
        .cloned()
        .unwrap_or_else(|| json!([]));

    Ok(Json(json!({ "themes": themes })))
}

/// Run one theme action.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the shop has no offline session,
/// `AppError::BadRequest` if a field the action needs is missing, or a
/// Shopify error for failures other than `userErrors`.
#[instrument(skip(state, request), fields(action = %request.action_type))]
pub async fn action(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    Json(request): Json<ThemeActionRequest>,
) -> Result<Json<Value>, AppError> {
    let target = resolve_target(&state, query.shop.as_deref()).await?;
    let admin = state.admin();

    match request.action_type.as_str() {
        "getFiles" => {
            let theme_id = required(request.theme_id, "themeId")?;
            let data = admin.get_theme_files(&target, &theme_id).await?;
            Ok(Json(json!({
                "success": true,
                "action": "getFiles",
                "theme": data.get("theme"),
            })))
        }
        "upsertFile" => {
            let theme_id = required(request.theme_id, "themeId")?;
            let filename = required(request.filename, "filename")?;
            let content = request.content.unwrap_or_default();
            let result = admin
                .upsert_file(&target, &theme_id, &filename, &content)
                .await;
            mutation_result(
                "upsertFile",
                result,
                "themeFilesUpsert",
                "upsertedThemeFiles",
                "upsertedFiles",
            )
        }
        "deleteFile" => {
            let theme_id = required(request.theme_id, "themeId")?;
            let filename = required(request.filename, "filename")?;
            let result = admin.delete_file(&target, &theme_id, &filename).await;
            mutation_result(
                "deleteFile",
                result,
                "themeFilesDelete",
                "deletedThemeFiles",
                "deletedFiles",
            )
        }
        _ => Ok(Json(json!({ "success": false, "error": "Unknown action" }))),
    }
}
