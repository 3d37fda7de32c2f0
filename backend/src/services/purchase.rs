//! Purchase lifecycle service
//!
//! The inbound mirror of sales: receiving a purchase enters stock and
//! records the money-out entry in one transaction; canceling a purchase
//! exits the received quantities and neutralizes the money-out with a
//! compensating entry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{MoneyKind, MoneyReference, PaymentMethod, PurchaseStatus, StockReference};
use shared::types::Pagination;
use shared::validation::validate_quantity;

use crate::error::{AppError, AppResult};
use crate::services::money::MoneyService;
use crate::services::stock::{StockLine, StockService};

/// Purchase lifecycle service
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
    stock: StockService,
    money: MoneyService,
}

/// A purchase header row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub warehouse_id: Uuid,
    pub supplier_name: Option<String>,
    pub status: String,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchase line
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseItemRecord {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub total: Decimal,
}

/// A purchase with its items
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    pub purchase: PurchaseRecord,
    pub items: Vec<PurchaseItemRecord>,
}

/// One received line in a purchase
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

/// Input for receiving a purchase
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseInput {
    pub warehouse_id: Uuid,
    pub supplier_name: Option<String>,
    pub items: Vec<PurchaseLineInput>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl PurchaseService {
    /// Create a new PurchaseService instance
    pub fn new(db: PgPool) -> Self {
        let stock = StockService::new(db.clone());
        let money = MoneyService::new(db.clone());
        Self { db, stock, money }
    }

    /// Receive a purchase: the purchase, its items, the stock entry for
    /// every item, and the money-out entry for the purchase total commit
    /// together.
    pub async fn create_purchase(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreatePurchaseInput,
    ) -> AppResult<PurchaseDetail> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A purchase needs at least one item".to_string(),
            });
        }

        self.ensure_active_warehouse(company_id, input.warehouse_id)
            .await?;

        let mut total = Decimal::ZERO;
        for item in &input.items {
            validate_quantity(item.quantity).map_err(|msg| AppError::Validation {
                field: "items".to_string(),
                message: msg.to_string(),
            })?;
            if item.unit_cost < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "items".to_string(),
                    message: "Unit cost cannot be negative".to_string(),
                });
            }
            self.ensure_product(company_id, item.product_id).await?;
            total += item.quantity * item.unit_cost;
        }

        let payment_method = input.payment_method.unwrap_or(PaymentMethod::Transfer);

        let mut tx = self.db.begin().await?;

        let purchase_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO purchases (company_id, warehouse_id, supplier_name, total, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(company_id)
        .bind(input.warehouse_id)
        .bind(&input.supplier_name)
        .bind(total)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut stock_lines = Vec::with_capacity(input.items.len());
        for item in &input.items {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (purchase_id, product_id, quantity, unit_cost, total)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(purchase_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_cost)
            .bind(item.quantity * item.unit_cost)
            .execute(&mut *tx)
            .await?;

            stock_lines.push(StockLine {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }

        self.stock
            .register_stock_entry(
                &mut *tx,
                company_id,
                input.warehouse_id,
                &stock_lines,
                purchase_id,
                user_id,
                Some(StockReference::Purchase),
            )
            .await?;

        if total > Decimal::ZERO {
            self.money
                .record_system_movement(
                    &mut *tx,
                    company_id,
                    user_id,
                    MoneyKind::Out,
                    total,
                    payment_method.as_str(),
                    MoneyReference::Purchase,
                    purchase_id,
                )
                .await?;
        }

        tx.commit().await?;

        self.get_purchase(company_id, purchase_id).await
    }

    /// Get a purchase with its items
    pub async fn get_purchase(
        &self,
        company_id: Uuid,
        purchase_id: Uuid,
    ) -> AppResult<PurchaseDetail> {
        let purchase = self.get_purchase_row(company_id, purchase_id).await?;

        let items = sqlx::query_as::<_, PurchaseItemRecord>(
            r#"
            SELECT id, purchase_id, product_id, quantity, unit_cost, total
            FROM purchase_items
            WHERE purchase_id = $1
            "#,
        )
        .bind(purchase_id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseDetail { purchase, items })
    }

    /// List purchases for a company, newest first
    pub async fn list_purchases(
        &self,
        company_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<Vec<PurchaseRecord>> {
        let purchases = sqlx::query_as::<_, PurchaseRecord>(
            r#"
            SELECT id, company_id, warehouse_id, supplier_name, status, total, notes,
                   created_by, created_at, updated_at
            FROM purchases
            WHERE company_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(purchases)
    }

    /// Cancel a received purchase.
    ///
    /// Exits the received quantities back out of stock (the goods return
    /// to the supplier), flips the purchase to CANCELED, and writes the
    /// compensating money-in entry, all in one transaction. The exit is
    /// pre-validated: quantities already sold or moved cannot be returned.
    pub async fn cancel_purchase(
        &self,
        company_id: Uuid,
        purchase_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<PurchaseDetail> {
        let purchase = self.get_purchase_row(company_id, purchase_id).await?;
        let status = parse_status(&purchase.status)?;
        if status == PurchaseStatus::Canceled {
            return Err(AppError::AlreadyCanceled("Purchase".to_string()));
        }

        let lines = sqlx::query_as::<_, StockLine>(
            "SELECT product_id, quantity FROM purchase_items WHERE purchase_id = $1",
        )
        .bind(purchase_id)
        .fetch_all(&self.db)
        .await?;

        for line in &lines {
            let available = self
                .stock
                .get_balance(company_id, line.product_id, purchase.warehouse_id)
                .await?;
            if line.quantity > available {
                return Err(AppError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }
        }

        let payment_method = self
            .money
            .reference_payment_method(
                company_id,
                MoneyReference::Purchase,
                purchase_id,
                MoneyKind::Out,
            )
            .await?
            .unwrap_or_else(|| PaymentMethod::Transfer.as_str().to_string());

        let mut tx = self.db.begin().await?;

        self.stock
            .register_stock_exit(
                &mut *tx,
                company_id,
                purchase.warehouse_id,
                &lines,
                purchase_id,
                user_id,
                Some(StockReference::Purchase),
            )
            .await?;

        sqlx::query("UPDATE purchases SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(PurchaseStatus::Canceled.as_str())
            .bind(purchase_id)
            .execute(&mut *tx)
            .await?;

        if purchase.total > Decimal::ZERO {
            self.money
                .record_system_movement(
                    &mut *tx,
                    company_id,
                    user_id,
                    MoneyKind::In,
                    purchase.total,
                    &payment_method,
                    MoneyReference::Purchase,
                    purchase_id,
                )
                .await?;
        }

        tx.commit().await?;

        self.get_purchase(company_id, purchase_id).await
    }

    async fn get_purchase_row(
        &self,
        company_id: Uuid,
        purchase_id: Uuid,
    ) -> AppResult<PurchaseRecord> {
        sqlx::query_as::<_, PurchaseRecord>(
            r#"
            SELECT id, company_id, warehouse_id, supplier_name, status, total, notes,
                   created_by, created_at, updated_at
            FROM purchases
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(purchase_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase".to_string()))
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

    /// Validate the product belongs to the company
    async fn ensure_product(&self, company_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND company_id = $2)",
        )
        .bind(product_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }
}

/// Parse a stored status string, which is constrained by the schema
fn parse_status(status: &str) -> AppResult<PurchaseStatus> {
    PurchaseStatus::from_str(status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "invalid purchase status in database: {status}"
        ))
    })
}
