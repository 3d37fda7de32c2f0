//! HTTP handlers for money ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::MoneyKind;
use shared::types::Pagination;

use crate::error::AppResult;
use crate::handlers::log_activity;
use crate::middleware::CurrentUser;
use crate::services::money::{
    CreateCategoryInput, CreateMoneyMovementInput, MoneyCategoryRecord, MoneyMovementFilter,
    MoneyMovementRecord, MoneyService, UpdateCategoryInput, UpdateMoneyMovementInput,
};
use crate::AppState;

/// Query parameters for listing money movements
#[derive(Debug, Deserialize)]
pub struct ListMoneyMovementsQuery {
    pub kind: Option<MoneyKind>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create a money category
pub async fn create_money_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCategoryInput>,
) -> AppResult<Json<MoneyCategoryRecord>> {
    let service = MoneyService::new(state.db);
    let category = service
        .create_category(current_user.0.company_id, input)
        .await?;
    Ok(Json(category))
}

/// List money categories
pub async fn list_money_categories(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<MoneyCategoryRecord>>> {
    let service = MoneyService::new(state.db);
    let categories = service.list_categories(current_user.0.company_id).await?;
    Ok(Json(categories))
}

/// Rename a money category
pub async fn update_money_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
    Json(input): Json<UpdateCategoryInput>,
) -> AppResult<Json<MoneyCategoryRecord>> {
    let service = MoneyService::new(state.db);
    let category = service
        .update_category(current_user.0.company_id, category_id, input)
        .await?;
    Ok(Json(category))
}

/// Delete a money category
pub async fn delete_money_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(category_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = MoneyService::new(state.db);
    service
        .delete_category(current_user.0.company_id, category_id)
        .await?;
    Ok(Json(()))
}

/// Record a manual money movement
pub async fn create_money_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateMoneyMovementInput>,
) -> AppResult<Json<MoneyMovementRecord>> {
    let service = MoneyService::new(state.db.clone());
    let movement = service
        .create_movement(current_user.0.company_id, current_user.0.user_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "money.create",
        "money_movement",
        Some(movement.id),
    )
    .await;

    Ok(Json(movement))
}

/// Get a money movement
pub async fn get_money_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MoneyMovementRecord>> {
    let service = MoneyService::new(state.db);
    let movement = service
        .get_movement(current_user.0.company_id, movement_id)
        .await?;
    Ok(Json(movement))
}

/// List money movements
pub async fn list_money_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListMoneyMovementsQuery>,
) -> AppResult<Json<Vec<MoneyMovementRecord>>> {
    let service = MoneyService::new(state.db);
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let filter = MoneyMovementFilter {
        kind: query.kind,
        category_id: query.category_id,
        from: query.from,
        to: query.to,
    };
    let movements = service
        .list_movements(current_user.0.company_id, filter, pagination)
        .await?;
    Ok(Json(movements))
}

/// Update a manual money movement
pub async fn update_money_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
    Json(input): Json<UpdateMoneyMovementInput>,
) -> AppResult<Json<MoneyMovementRecord>> {
    let service = MoneyService::new(state.db.clone());
    let movement = service
        .update_movement(current_user.0.company_id, movement_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "money.update",
        "money_movement",
        Some(movement_id),
    )
    .await;

    Ok(Json(movement))
}

/// Delete a manual money movement
pub async fn delete_money_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = MoneyService::new(state.db.clone());
    service
        .delete_movement(current_user.0.company_id, movement_id)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "money.delete",
        "money_movement",
        Some(movement_id),
    )
    .await;

    Ok(Json(()))
}
