//! Order lifecycle service
//!
//! Orders reserve inventory rather than consuming it at creation: stock
//! leaves the ledger when an order is confirmed and comes back if the
//! order is canceled before delivery. All multi-step mutations run inside
//! one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

use shared::models::{OrderStatus, PaymentMethod, StockReference};
use shared::types::Pagination;
use shared::validation::{compute_totals, payment_fits, settle_payment_status, validate_amount};

use crate::error::{AppError, AppResult};
use crate::services::stock::{StockLine, StockService};

/// Order lifecycle service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    stock: StockService,
}

/// An order header row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub warehouse_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line with the cost snapshot taken at creation time
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItemRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub base_price: Decimal,
    pub cost: Decimal,
    pub total: Decimal,
}

/// A payment recorded against an order
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderPaymentRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

/// An order with its items and payments
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
    pub payments: Vec<OrderPaymentRecord>,
}

/// One requested line in an order
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    /// Unit price override; falls back to the product's list price
    pub base_price: Option<Decimal>,
}

/// Input for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub warehouse_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub items: Vec<OrderLineInput>,
    pub discount: Option<Decimal>,
    pub delivery_fee: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for replacing an order's items
#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    pub items: Vec<OrderLineInput>,
}

/// Input for a status transition
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusInput {
    pub status: OrderStatus,
}

/// Input for recording a payment
#[derive(Debug, Deserialize)]
pub struct AddPaymentInput {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

/// Product data loaded for order/sale line validation
#[derive(Debug, FromRow)]
struct ProductLineRow {
    id: Uuid,
    is_active: bool,
    price: Decimal,
    cost: Decimal,
    available: Decimal,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        let stock = StockService::new(db.clone());
        Self { db, stock }
    }

    /// Create an order in PENDING state. Validates warehouse, customer,
    /// and stock sufficiency, and snapshots each item's cost, but moves no
    /// stock: inventory leaves the ledger only at confirmation.
    pub async fn create_order(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> AppResult<OrderDetail> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "An order needs at least one item".to_string(),
            });
        }

        self.ensure_active_warehouse(company_id, input.warehouse_id)
            .await?;
        if let Some(customer_id) = input.customer_id {
            self.ensure_customer(company_id, customer_id).await?;
        }

        let products = self
            .load_product_lines(company_id, input.warehouse_id, &input.items)
            .await?;
        check_availability(&input.items, &products)?;

        let discount = input.discount.unwrap_or(Decimal::ZERO);
        let delivery_fee = input.delivery_fee.unwrap_or(Decimal::ZERO);
        let lines = price_lines(&input.items, &products);
        let totals = compute_totals(&lines, discount, delivery_fee).map_err(|msg| {
            AppError::Validation {
                field: "totals".to_string(),
                message: msg.to_string(),
            }
        })?;

        let mut tx = self.db.begin().await?;

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO orders (company_id, warehouse_id, customer_id, subtotal, discount,
                                delivery_fee, total, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(company_id)
        .bind(input.warehouse_id)
        .bind(input.customer_id)
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.delivery_fee)
        .bind(totals.total)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        self.insert_items(&mut tx, order_id, &input.items, &products)
            .await?;

        tx.commit().await?;

        self.get_order(company_id, order_id).await
    }

    /// Get an order with its items and payments
    pub async fn get_order(&self, company_id: Uuid, order_id: Uuid) -> AppResult<OrderDetail> {
        let order = self.get_order_row(company_id, order_id).await?;
        let items = sqlx::query_as::<_, OrderItemRecord>(
            r#"
            SELECT id, order_id, product_id, quantity, base_price, cost, total
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        let payments = sqlx::query_as::<_, OrderPaymentRecord>(
            r#"
            SELECT id, order_id, amount, payment_method, created_at
            FROM order_payments
            WHERE order_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(OrderDetail {
            order,
            items,
            payments,
        })
    }

    /// List orders for a company, newest first
    pub async fn list_orders(
        &self,
        company_id: Uuid,
        status: Option<OrderStatus>,
        pagination: Pagination,
    ) -> AppResult<Vec<OrderRecord>> {
        let orders = sqlx::query_as::<_, OrderRecord>(
            r#"
            SELECT id, company_id, warehouse_id, customer_id, status, payment_status,
                   subtotal, discount, delivery_fee, total, notes, created_by,
                   created_at, updated_at
            FROM orders
            WHERE company_id = $1
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(company_id)
        .bind(status.map(|s| s.as_str()))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(orders)
    }

    /// Transition an order to a new status.
    ///
    /// Entering CONFIRMED exits the order's items from stock; canceling an
    /// order that holds stock returns exactly those quantities. Both the
    /// stock movements and the status change commit together.
    pub async fn update_order_status(
        &self,
        company_id: Uuid,
        order_id: Uuid,
        user_id: Uuid,
        input: UpdateOrderStatusInput,
    ) -> AppResult<OrderDetail> {
        let order = self.get_order_row(company_id, order_id).await?;
        let current = parse_status(&order.status)?;
        let next = input.status;

        if !current.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot move order from {} to {}",
                current.as_str(),
                next.as_str()
            )));
        }

        let lines = self.order_lines(order_id).await?;

        // Confirming reserves stock, so the caller-side sufficiency check
        // happens here rather than inside the ledger primitive.
        if next == OrderStatus::Confirmed && !current.holds_stock() {
            self.check_lines_available(company_id, order.warehouse_id, &lines)
                .await?;
        }

        let mut tx = self.db.begin().await?;

        if next == OrderStatus::Confirmed && !current.holds_stock() {
            self.stock
                .register_stock_exit(
                    &mut *tx,
                    company_id,
                    order.warehouse_id,
                    &lines,
                    order.id,
                    user_id,
                    Some(StockReference::Order),
                )
                .await?;
        } else if next == OrderStatus::Canceled && current.holds_stock() {
            self.stock
                .register_stock_entry(
                    &mut *tx,
                    company_id,
                    order.warehouse_id,
                    &lines,
                    order.id,
                    user_id,
                    Some(StockReference::Order),
                )
                .await?;
        }

        sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(next.as_str())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_order(company_id, order_id).await
    }

    /// Replace an order's items.
    ///
    /// For an order that holds stock this rolls back the previous
    /// reservation and applies the new one (return the old quantities,
    /// exit the new ones) inside a single transaction so the ledger never
    /// sees a partial application.
    pub async fn update_order(
        &self,
        company_id: Uuid,
        order_id: Uuid,
        user_id: Uuid,
        input: UpdateOrderInput,
    ) -> AppResult<OrderDetail> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "An order needs at least one item".to_string(),
            });
        }

        let order = self.get_order_row(company_id, order_id).await?;
        let current = parse_status(&order.status)?;
        if current.is_terminal() {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot modify items of a {} order",
                current.as_str()
            )));
        }

        let products = self
            .load_product_lines(company_id, order.warehouse_id, &input.items)
            .await?;

        let old_lines = self.order_lines(order_id).await?;

        if current.holds_stock() {
            // The old reservation comes back in the same transaction, so it
            // counts as available for the new item set.
            let mut returned: BTreeMap<Uuid, Decimal> = BTreeMap::new();
            for line in &old_lines {
                *returned.entry(line.product_id).or_default() += line.quantity;
            }
            check_availability_with_credit(&input.items, &products, &returned)?;
        } else {
            check_availability(&input.items, &products)?;
        }

        let lines = price_lines(&input.items, &products);
        let totals =
            compute_totals(&lines, order.discount, order.delivery_fee).map_err(|msg| {
                AppError::Validation {
                    field: "totals".to_string(),
                    message: msg.to_string(),
                }
            })?;

        let paid = self.paid_sum(order_id).await?;
        if paid > totals.total {
            return Err(AppError::PaymentExceedsTotal {
                total: totals.total,
                attempted: paid,
            });
        }

        let mut tx = self.db.begin().await?;

        if current.holds_stock() {
            self.stock
                .register_stock_entry(
                    &mut *tx,
                    company_id,
                    order.warehouse_id,
                    &old_lines,
                    order.id,
                    user_id,
                    Some(StockReference::Order),
                )
                .await?;
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        self.insert_items(&mut tx, order_id, &input.items, &products)
            .await?;

        if current.holds_stock() {
            let new_lines: Vec<StockLine> = input
                .items
                .iter()
                .map(|item| StockLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect();
            self.stock
                .register_stock_exit(
                    &mut *tx,
                    company_id,
                    order.warehouse_id,
                    &new_lines,
                    order.id,
                    user_id,
                    Some(StockReference::Order),
                )
                .await?;
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET subtotal = $1, total = $2, payment_status = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(totals.subtotal)
        .bind(totals.total)
        .bind(settle_payment_status(totals.total, paid).as_str())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_order(company_id, order_id).await
    }

    /// Record a payment against an order. The cumulative payments may
    /// never exceed the order total; reaching the total flips the payment
    /// status to paid.
    pub async fn add_order_payment(
        &self,
        company_id: Uuid,
        order_id: Uuid,
        input: AddPaymentInput,
    ) -> AppResult<OrderDetail> {
        validate_amount(input.amount).map_err(|msg| AppError::Validation {
            field: "amount".to_string(),
            message: msg.to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        // Lock the order row so concurrent payments serialize on the cap check
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT total FROM orders WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(order_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let paid = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM order_payments WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        if !payment_fits(total, paid, input.amount) {
            return Err(AppError::PaymentExceedsTotal {
                total,
                attempted: paid + input.amount,
            });
        }

        sqlx::query("INSERT INTO order_payments (order_id, amount, payment_method) VALUES ($1, $2, $3)")
            .bind(order_id)
            .bind(input.amount)
            .bind(input.payment_method.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE orders SET payment_status = $1, updated_at = NOW() WHERE id = $2")
            .bind(settle_payment_status(total, paid + input.amount).as_str())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_order(company_id, order_id).await
    }

    async fn get_order_row(&self, company_id: Uuid, order_id: Uuid) -> AppResult<OrderRecord> {
        sqlx::query_as::<_, OrderRecord>(
            r#"
            SELECT id, company_id, warehouse_id, customer_id, status, payment_status,
                   subtotal, discount, delivery_fee, total, notes, created_by,
                   created_at, updated_at
            FROM orders
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(order_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    /// Current item set of an order as ledger lines
    async fn order_lines(&self, order_id: Uuid) -> AppResult<Vec<StockLine>> {
        let lines = sqlx::query_as::<_, StockLine>(
            "SELECT product_id, quantity FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(lines)
    }

    async fn paid_sum(&self, order_id: Uuid) -> AppResult<Decimal> {
        let paid = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM order_payments WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;

        Ok(paid)
    }

    /// Load products referenced by the requested lines together with their
    /// availability at the target warehouse
    async fn load_product_lines(
        &self,
        company_id: Uuid,
        warehouse_id: Uuid,
        items: &[OrderLineInput],
    ) -> AppResult<BTreeMap<Uuid, ProductLineRow>> {
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();

        let rows = sqlx::query_as::<_, ProductLineRow>(
            r#"
            SELECT p.id, p.is_active, p.price, p.cost,
                   COALESCE(sb.quantity, 0) AS available
            FROM products p
            LEFT JOIN stock_balances sb
                   ON sb.product_id = p.id AND sb.warehouse_id = $2
            WHERE p.company_id = $1 AND p.id = ANY($3)
            "#,
        )
        .bind(company_id)
        .bind(warehouse_id)
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let products: BTreeMap<Uuid, ProductLineRow> =
            rows.into_iter().map(|row| (row.id, row)).collect();

        for item in items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| AppError::NotFound(format!("Product {}", item.product_id)))?;
            if !product.is_active {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: format!("Product {} is inactive", item.product_id),
                });
            }
            if item.quantity <= Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: "Quantity must be positive".to_string(),
                });
            }
        }

        Ok(products)
    }

    async fn insert_items(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        items: &[OrderLineInput],
        products: &BTreeMap<Uuid, ProductLineRow>,
    ) -> AppResult<()> {
        for item in items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| AppError::NotFound(format!("Product {}", item.product_id)))?;
            let unit_price = item.base_price.unwrap_or(product.price);

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, base_price, cost, total)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(unit_price)
            .bind(product.cost)
            .bind(item.quantity * unit_price)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Re-check sufficiency for already-persisted lines (confirm path)
    async fn check_lines_available(
        &self,
        company_id: Uuid,
        warehouse_id: Uuid,
        lines: &[StockLine],
    ) -> AppResult<()> {
        let mut requested: BTreeMap<Uuid, Decimal> = BTreeMap::new();
        for line in lines {
            *requested.entry(line.product_id).or_default() += line.quantity;
        }

        for (product_id, quantity) in requested {
            let available = self
                .stock
                .get_balance(company_id, product_id, warehouse_id)
                .await?;
            if quantity > available {
                return Err(AppError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Validate the warehouse belongs to the company and is active
    async fn ensure_active_warehouse(&self, company_id: Uuid, warehouse_id: Uuid) -> AppResult<()> {
        let is_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM warehouses WHERE id = $1 AND company_id = $2",
        )
        .bind(warehouse_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        if !is_active {
            return Err(AppError::Validation {
                field: "warehouse_id".to_string(),
                message: "Warehouse is not active".to_string(),
            });
        }
        Ok(())
    }

    /// Validate the customer belongs to the company
    async fn ensure_customer(&self, company_id: Uuid, customer_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1 AND company_id = $2)",
        )
        .bind(customer_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }
}

/// Parse a stored status string, which is constrained by the schema
fn parse_status(status: &str) -> AppResult<OrderStatus> {
    OrderStatus::from_str(status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("invalid order status in database: {status}"))
    })
}

/// Requested quantities per product may not exceed the available balance
fn check_availability(
    items: &[OrderLineInput],
    products: &BTreeMap<Uuid, ProductLineRow>,
) -> AppResult<()> {
    check_availability_with_credit(items, products, &BTreeMap::new())
}

/// Availability check where quantities being returned in the same
/// transaction count toward the available balance
fn check_availability_with_credit(
    items: &[OrderLineInput],
    products: &BTreeMap<Uuid, ProductLineRow>,
    credit: &BTreeMap<Uuid, Decimal>,
) -> AppResult<()> {
    let mut requested: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for item in items {
        *requested.entry(item.product_id).or_default() += item.quantity;
    }

    for (product_id, quantity) in requested {
        let product = products
            .get(&product_id)
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))?;
        let available =
            product.available + credit.get(&product_id).copied().unwrap_or(Decimal::ZERO);
        if quantity > available {
            return Err(AppError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            });
        }
    }
    Ok(())
}

/// (quantity, unit price) pairs for totals computation
fn price_lines(
    items: &[OrderLineInput],
    products: &BTreeMap<Uuid, ProductLineRow>,
) -> Vec<(Decimal, Decimal)> {
    items
        .iter()
        .map(|item| {
            let unit_price = item
                .base_price
                .unwrap_or_else(|| products.get(&item.product_id).map(|p| p.price).unwrap_or(Decimal::ZERO));
            (item.quantity, unit_price)
        })
        .collect()
}
