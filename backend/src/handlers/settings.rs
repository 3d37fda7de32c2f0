//! HTTP handlers for company settings endpoints

use axum::{extract::State, Json};
use serde_json::{Map, Value};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::settings::SettingsService;
use crate::AppState;

/// The stored settings map
pub async fn get_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Map<String, Value>>> {
    let service = SettingsService::new(state.db);
    let settings = service.get_settings(current_user.0.company_id).await?;
    Ok(Json(settings))
}

/// Shallow-merge the provided keys over the stored settings
pub async fn update_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(patch): Json<Map<String, Value>>,
) -> AppResult<Json<Map<String, Value>>> {
    let service = SettingsService::new(state.db);
    let settings = service
        .update_settings(current_user.0.company_id, patch)
        .await?;
    Ok(Json(settings))
}
