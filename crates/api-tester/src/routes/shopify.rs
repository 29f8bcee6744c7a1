//! Shopify Admin GraphQL proxy endpoints.
//!
//! Every handler needs `X-Store-Id`. A missing header is rejected with 400 and
//! an unknown id with 404, both before any upstream call.
//!
//! ```text
//! GET    /api/shopify/shop                           - Shop info (connection test)
//! GET    /api/shopify/themes                         - List themes
//! GET    /api/shopify/themes/{themeId}               - List a theme's files
//! POST   /api/shopify/themes/{themeId}               - Same as POST .../files
//! DELETE /api/shopify/themes/{themeId}               - Same as DELETE .../files
//! GET    /api/shopify/themes/{themeId}/files?filename=  - File body
//! POST   /api/shopify/themes/{themeId}/files         - Upsert {filename, content}
//! DELETE /api/shopify/themes/{themeId}/files?filename=  - Delete a file
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::StoreIdHeader;
use crate::shopify::StoreTarget;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FilenameQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertFileRequest {
    pub filename: Option<String>,
    pub content: Option<String>,
}

/// Resolve `X-Store-Id` to an Admin API target.
async fn resolve_target(state: &AppState, header: StoreIdHeader) -> Result<StoreTarget, AppError> {
    let not_found = || AppError::NotFound("Store not found".to_string());
    let id = header.0.ok_or_else(not_found)?;
    let credential = state
        .store_credentials()
        .get(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(StoreTarget::from(&credential))
}

fn required_filename(filename: Option<String>) -> Result<String, AppError> {
    filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing filename query parameter".to_string()))
}

#[instrument(skip(state))]
pub async fn shop(
    store: StoreIdHeader,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let target = resolve_target(&state, store).await?;
    Ok(Json(state.shopify().get_shop(&target).await?))
}

#[instrument(skip(state))]
pub async fn themes(
    store: StoreIdHeader,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let target = resolve_target(&state, store).await?;
    Ok(Json(state.shopify().list_themes(&target).await?))
}

#[instrument(skip(state))]
pub async fn theme_files(
    store: StoreIdHeader,
    State(state): State<AppState>,
    Path(theme_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let target = resolve_target(&state, store).await?;
    Ok(Json(
        state.shopify().get_theme_files(&target, &theme_id).await?,
    ))
}

#[instrument(skip(state))]
pub async fn file_content(
    store: StoreIdHeader,
    State(state): State<AppState>,
    Path(theme_id): Path<String>,
    Query(query): Query<FilenameQuery>,
) -> Result<Json<Value>, AppError> {
    let filename = required_filename(query.filename)?;
    let target = resolve_target(&state, store).await?;
    Ok(Json(
        state
            .shopify()
            .get_file_content(&target, &theme_id, &filename)
            .await?,
    ))
}

#[instrument(skip(state, body))]
pub async fn upsert_file(
    store: StoreIdHeader,
    State(state): State<AppState>,
    Path(theme_id): Path<String>,
    Json(body): Json<UpsertFileRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(filename), Some(content)) = (
        body.filename.filter(|f| !f.trim().is_empty()),
        body.content,
    ) else {
        return Err(AppError::BadRequest(
            "Missing required fields: filename, content".to_string(),
        ));
    };

    let target = resolve_target(&state, store).await?;
    Ok(Json(
        state
            .shopify()
            .upsert_file(&target, &theme_id, &filename, &content)
            .await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_file(
    store: StoreIdHeader,
    State(state): State<AppState>,
    Path(theme_id): Path<String>,
    Query(query): Query<FilenameQuery>,
) -> Result<Json<Value>, AppError> {
    let filename = required_filename(query.filename)?;
    let target = resolve_target(&state, store).await?;
    Ok(Json(
        state
            .shopify()
            .delete_file(&target, &theme_id, &filename)
            .await?,
    ))
}
