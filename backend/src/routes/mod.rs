//! Route definitions for the Retail Inventory Management Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - product management
        .nest("/products", product_routes())
        // Protected routes - warehouse management
        .nest("/warehouses", warehouse_routes())
        // Protected routes - customer management
        .nest("/customers", customer_routes())
        // Protected routes - stock ledger
        .nest("/stock", stock_routes())
        // Protected routes - order management
        .nest("/orders", order_routes())
        // Protected routes - sale management
        .nest("/sales", sale_routes())
        // Protected routes - purchase management
        .nest("/purchases", purchase_routes())
        // Protected routes - money ledger
        .nest("/money", money_routes())
        // Protected routes - company settings
        .nest("/settings", settings_routes())
        // Protected routes - activity log
        .nest("/activity", activity_routes())
}

/// Product management routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product).put(handlers::update_product),
        )
        .route(
            "/:product_id/deactivate",
            post(handlers::deactivate_product),
        )
        .route("/:product_id/stock", get(handlers::get_product_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Warehouse management routes (protected)
fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_warehouses).post(handlers::create_warehouse),
        )
        .route(
            "/:warehouse_id",
            get(handlers::get_warehouse).put(handlers::update_warehouse),
        )
        .route(
            "/:warehouse_id/deactivate",
            post(handlers::deactivate_warehouse),
        )
        .route(
            "/:warehouse_id/balances",
            get(handlers::list_warehouse_balances),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Customer management routes (protected)
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer).put(handlers::update_customer),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock ledger routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/movements", get(handlers::list_movements))
        .route("/transfers", post(handlers::transfer_stock))
        .route("/adjustments", post(handlers::create_adjustment))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order management routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order).put(handlers::update_order),
        )
        .route("/:order_id/status", put(handlers::update_order_status))
        .route("/:order_id/payments", post(handlers::add_order_payment))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sale management routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/:sale_id", get(handlers::get_sale))
        .route("/:sale_id/cancel", post(handlers::cancel_sale))
        .route("/:sale_id/payments", post(handlers::add_sale_payment))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Purchase management routes (protected)
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchases).post(handlers::create_purchase),
        )
        .route("/:purchase_id", get(handlers::get_purchase))
        .route("/:purchase_id/cancel", post(handlers::cancel_purchase))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Money ledger routes (protected)
fn money_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(handlers::list_money_categories).post(handlers::create_money_category),
        )
        .route(
            "/categories/:category_id",
            put(handlers::update_money_category).delete(handlers::delete_money_category),
        )
        .route(
            "/movements",
            get(handlers::list_money_movements).post(handlers::create_money_movement),
        )
        .route(
            "/movements/:movement_id",
            get(handlers::get_money_movement)
                .put(handlers::update_money_movement)
                .delete(handlers::delete_money_movement),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Company settings routes (protected)
fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Activity log routes (protected)
fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_activity_history))
        .route("/recent", get(handlers::get_recent_activity))
        .route_layer(middleware::from_fn(auth_middleware))
}
