//! `POST /api/sync-token` - import sessions from the theme modifier database.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::AppError;
use crate::services::sync::sync_sessions;
use crate::state::AppState;

/// Read the configured session source and upsert one credential per shop.
#[instrument(skip(state))]
pub async fn sync_token(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let repo = state.store_credentials();
    let report = sync_sessions(
        &repo,
        state.session_source(),
        &state.config().sync.app_name,
    )
    .await?;

    if report.sessions_found == 0 {
        return Ok(Json(json!({
            "success": false,
            "error": "No sessions found. Install the app in a store first.",
        })));
    }

    Ok(Json(json!({
        "success": true,
        "message": report.message(),
        "results": report.results,
    })))
}
