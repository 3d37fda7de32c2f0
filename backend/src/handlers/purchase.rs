//! HTTP handlers for purchase endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::types::Pagination;

use crate::error::AppResult;
use crate::handlers::log_activity;
use crate::middleware::CurrentUser;
use crate::services::purchase::{
    CreatePurchaseInput, PurchaseDetail, PurchaseRecord, PurchaseService,
};
use crate::AppState;

/// Query parameters for listing purchases
#[derive(Debug, Deserialize)]
pub struct ListPurchasesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Receive a purchase
pub async fn create_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePurchaseInput>,
) -> AppResult<Json<PurchaseDetail>> {
    let service = PurchaseService::new(state.db.clone());
    let purchase = service
        .create_purchase(current_user.0.company_id, current_user.0.user_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "purchase.create",
        "purchase",
        Some(purchase.purchase.id),
    )
    .await;

    Ok(Json(purchase))
}

/// Get a purchase with items
pub async fn get_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<PurchaseDetail>> {
    let service = PurchaseService::new(state.db);
    let purchase = service
        .get_purchase(current_user.0.company_id, purchase_id)
        .await?;
    Ok(Json(purchase))
}

/// List purchases
pub async fn list_purchases(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListPurchasesQuery>,
) -> AppResult<Json<Vec<PurchaseRecord>>> {
    let service = PurchaseService::new(state.db);
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let purchases = service
        .list_purchases(current_user.0.company_id, pagination)
        .await?;
    Ok(Json(purchases))
}

/// Cancel a purchase, reversing its stock and money effects
pub async fn cancel_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<PurchaseDetail>> {
    let service = PurchaseService::new(state.db.clone());
    let purchase = service
        .cancel_purchase(current_user.0.company_id, purchase_id, current_user.0.user_id)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "purchase.cancel",
        "purchase",
        Some(purchase_id),
    )
    .await;

    Ok(Json(purchase))
}
