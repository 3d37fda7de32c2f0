//! HTTP handlers for customer endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::types::Pagination;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::customer::{
    CreateCustomerInput, CustomerRecord, CustomerService, UpdateCustomerInput,
};
use crate::AppState;

/// Query parameters for listing customers
#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create a customer
pub async fn create_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<Json<CustomerRecord>> {
    let service = CustomerService::new(state.db);
    let customer = service
        .create_customer(current_user.0.company_id, input)
        .await?;
    Ok(Json(customer))
}

/// Get a customer
pub async fn get_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<CustomerRecord>> {
    let service = CustomerService::new(state.db);
    let customer = service
        .get_customer(current_user.0.company_id, customer_id)
        .await?;
    Ok(Json(customer))
}

/// List customers
pub async fn list_customers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListCustomersQuery>,
) -> AppResult<Json<Vec<CustomerRecord>>> {
    let service = CustomerService::new(state.db);
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let customers = service
        .list_customers(current_user.0.company_id, pagination)
        .await?;
    Ok(Json(customers))
}

/// Update a customer
pub async fn update_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<CustomerRecord>> {
    let service = CustomerService::new(state.db);
    let customer = service
        .update_customer(current_user.0.company_id, customer_id, input)
        .await?;
    Ok(Json(customer))
}
