//! HTTP handlers for product endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::types::{PaginatedResponse, Pagination};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::product::{
    CreateProductInput, ProductRecord, ProductService, ProductWithStock, UpdateProductInput,
};
use crate::AppState;

/// Query parameters for listing products
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<ProductRecord>> {
    let service = ProductService::new(state.db);
    let product = service
        .create_product(current_user.0.company_id, input)
        .await?;
    Ok(Json(product))
}

/// Get a product with its total stock
pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductWithStock>> {
    let service = ProductService::new(state.db);
    let product = service
        .get_product(current_user.0.company_id, product_id)
        .await?;
    Ok(Json(product))
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListProductsQuery>,
) -> AppResult<Json<PaginatedResponse<ProductRecord>>> {
    let service = ProductService::new(state.db);
    let pagination = Pagination {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let products = service
        .list_products(current_user.0.company_id, query.include_inactive, pagination)
        .await?;
    Ok(Json(products))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductRecord>> {
    let service = ProductService::new(state.db);
    let product = service
        .update_product(current_user.0.company_id, product_id, input)
        .await?;
    Ok(Json(product))
}

/// Deactivate a product
pub async fn deactivate_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductRecord>> {
    let service = ProductService::new(state.db);
    let product = service
        .deactivate_product(current_user.0.company_id, product_id)
        .await?;
    Ok(Json(product))
}
