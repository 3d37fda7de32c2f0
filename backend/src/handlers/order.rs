//! HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::OrderStatus;
use shared::types::Pagination;

use crate::error::AppResult;
use crate::handlers::log_activity;
use crate::middleware::CurrentUser;
use crate::services::order::{
    AddPaymentInput, CreateOrderInput, OrderDetail, OrderRecord, OrderService, UpdateOrderInput,
    UpdateOrderStatusInput,
};
use crate::AppState;

/// Query parameters for listing orders
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    let order = service
        .create_order(current_user.0.company_id, current_user.0.user_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "order.create",
        "order",
        Some(order.order.id),
    )
    .await;

    Ok(Json(order))
}

/// Get an order with items and payments
pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db);
    let order = service
        .get_order(current_user.0.company_id, order_id)
        .await?;
    Ok(Json(order))
}

/// List orders
pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<Vec<OrderRecord>>> {
    let service = OrderService::new(state.db);
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let orders = service
        .list_orders(current_user.0.company_id, query.status, pagination)
        .await?;
    Ok(Json(orders))
}

/// Transition an order's status
pub async fn update_order_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderStatusInput>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    let order = service
        .update_order_status(
            current_user.0.company_id,
            order_id,
            current_user.0.user_id,
            input,
        )
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "order.status",
        "order",
        Some(order_id),
    )
    .await;

    Ok(Json(order))
}

/// Replace an order's items
pub async fn update_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    let order = service
        .update_order(
            current_user.0.company_id,
            order_id,
            current_user.0.user_id,
            input,
        )
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "order.update",
        "order",
        Some(order_id),
    )
    .await;

    Ok(Json(order))
}

/// Record a payment against an order
pub async fn add_order_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<AddPaymentInput>,
) -> AppResult<Json<OrderDetail>> {
    let service = OrderService::new(state.db.clone());
    let order = service
        .add_order_payment(current_user.0.company_id, order_id, input)
        .await?;

    log_activity(
        &state,
        &current_user.0,
        "order.payment",
        "order",
        Some(order_id),
    )
    .await;

    Ok(Json(order))
}
