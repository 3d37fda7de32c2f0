//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::SaleStatus;
use shared::types::Pagination;

use crate::error::AppResult;
use crate::handlers::log_activity;
use crate::middleware::CurrentUser;
use crate::services::sale::{
    AddSalePaymentInput, CancelSaleInput, CreateSaleInput, SaleDetail, SaleRecord, SaleService,
};
use crate::AppState;

/// Query parameters for listing sales
#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    pub status: Option<SaleStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create a sale
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<SaleDetail>> {
    let service = SaleService::new(state.db.clone());
    let sale = service
        .create_sale(current_user.0.company_id, current_user.0.user_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "sale.create",
        "sale",
        Some(sale.sale.id),
    )
    .await;

    Ok(Json(sale))
}

/// Get a sale with items and payments
pub async fn get_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleDetail>> {
    let service = SaleService::new(state.db);
    let sale = service.get_sale(current_user.0.company_id, sale_id).await?;
    Ok(Json(sale))
}

/// List sales
pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListSalesQuery>,
) -> AppResult<Json<Vec<SaleRecord>>> {
    let service = SaleService::new(state.db);
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let sales = service
        .list_sales(current_user.0.company_id, query.status, pagination)
        .await?;
    Ok(Json(sales))
}

/// Cancel a sale, reversing its stock and money effects
pub async fn cancel_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<CancelSaleInput>,
) -> AppResult<Json<SaleDetail>> {
    let service = SaleService::new(state.db.clone());
    let sale = service
        .cancel_sale(
            current_user.0.company_id,
            sale_id,
            current_user.0.user_id,
            input,
        )
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "sale.cancel",
        "sale",
        Some(sale_id),
    )
    .await;

    Ok(Json(sale))
}

/// Record a payment against a sale
pub async fn add_sale_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<AddSalePaymentInput>,
) -> AppResult<Json<SaleDetail>> {
    let service = SaleService::new(state.db.clone());
    let sale = service
        .add_sale_payment(current_user.0.company_id, sale_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "sale.payment",
        "sale",
        Some(sale_id),
    )
    .await;

    Ok(Json(sale))
}
