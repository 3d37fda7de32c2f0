//! HTTP handlers for stock ledger endpoints

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
use crate::services::stock::{
    CreateAdjustmentInput, MovementFilter, ProductStock, StockMovementRecord, StockService,
    StockTransfer, TransferStockInput, WarehouseBalance,
};
use crate::AppState;

/// Query parameters for listing movements
#[derive(Debug, Deserialize)]
pub struct ListMovementsQuery {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Transfer stock between warehouses
pub async fn transfer_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<TransferStockInput>,
) -> AppResult<Json<StockTransfer>> {
    let service = StockService::new(state.db.clone());
    let transfer = service
        .transfer_stock(current_user.0.company_id, current_user.0.user_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "stock.transfer",
        "stock_movement",
        Some(transfer.reference_id),
    )
    .await;

    Ok(Json(transfer))
}

/// Record a manual stock adjustment
pub async fn create_adjustment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateAdjustmentInput>,
) -> AppResult<Json<StockMovementRecord>> {
    let service = StockService::new(state.db.clone());
    let movement = service
        .create_adjustment(current_user.0.company_id, current_user.0.user_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "stock.adjust",
        "stock_movement",
        Some(movement.id),
    )
    .await;

    Ok(Json(movement))
}

/// List stock movements
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListMovementsQuery>,
) -> AppResult<Json<Vec<StockMovementRecord>>> {
    let service = StockService::new(state.db);
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let filter = MovementFilter {
        product_id: query.product_id,
        warehouse_id: query.warehouse_id,
        reference_id: query.reference_id,
    };
    let movements = service
        .list_movements(current_user.0.company_id, filter, pagination)
        .await?;
    Ok(Json(movements))
}

/// List balances held at a warehouse
pub async fn list_warehouse_balances(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<Vec<WarehouseBalance>>> {
    let service = StockService::new(state.db);
    let balances = service
        .list_warehouse_balances(current_user.0.company_id, warehouse_id)
        .await?;
    Ok(Json(balances))
}

/// A product's stock position across warehouses
pub async fn get_product_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductStock>> {
    let service = StockService::new(state.db);
    let stock = service
        .get_product_stock(current_user.0.company_id, product_id)
        .await?;
    Ok(Json(stock))
}
