//! HTTP handlers for activity log endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use shared::types::Pagination;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::activity::ActivityEntry;
use crate::AppState;

/// Query parameters for activity history
#[derive(Debug, Deserialize)]
pub struct ActivityHistoryQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Recent activity, served from the in-process cache
pub async fn get_recent_activity(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ActivityEntry>>> {
    let entries = state.activity.recent(current_user.0.company_id).await;
    Ok(Json(entries))
}

/// Full activity history from the persisted log
pub async fn get_activity_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ActivityHistoryQuery>,
) -> AppResult<Json<Vec<ActivityEntry>>> {
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let entries = state
        .activity
        .history(current_user.0.company_id, pagination)
        .await?;
    Ok(Json(entries))
}
