//! Stock ledger service
//!
//! Maintains the per (product, warehouse) balances and the append-only
//! movement log. Every balance change goes through the ledger primitives
//! here; the materialized balance always equals the signed sum of the
//! movements recorded for the pair.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::models::{MovementKind, StockReference};
use shared::types::Pagination;
use shared::validation::validate_quantity;

use crate::error::{AppError, AppResult};

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// A recorded stock movement. Immutable once written.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockMovementRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub kind: String,
    pub quantity: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One product line in a ledger operation
#[derive(Debug, Clone, Deserialize, FromRow)]
pub struct StockLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
}

/// Input for transferring stock between warehouses
#[derive(Debug, Deserialize)]
pub struct TransferStockInput {
    pub product_id: Uuid,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub quantity: Decimal,
    pub notes: Option<String>,
}

/// The movement pair produced by a transfer
#[derive(Debug, Clone, Serialize)]
pub struct StockTransfer {
    pub reference_id: Uuid,
    pub outbound: StockMovementRecord,
    pub inbound: StockMovementRecord,
}

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize)]
pub struct CreateAdjustmentInput {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub notes: Option<String>,
}

/// Filters for listing movements
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
}

/// Balance of one product at one warehouse
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WarehouseBalance {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: Uuid,
    pub quantity: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Per-warehouse balance row for a single product
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductWarehouseBalance {
    pub warehouse_id: Uuid,
    pub warehouse_name: String,
    pub quantity: Decimal,
}

/// A product's stock position across all warehouses
#[derive(Debug, Clone, Serialize)]
pub struct ProductStock {
    pub product_id: Uuid,
    pub total: Decimal,
    pub by_warehouse: Vec<ProductWarehouseBalance>,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record an OUT movement and decrement the balance for every item,
    /// within the caller's transaction.
    ///
    /// The reference type defaults to SALE unless specified. No
    /// available-stock check happens here; callers pre-validate
    /// sufficiency before exiting stock.
    pub async fn register_stock_exit(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        warehouse_id: Uuid,
        items: &[StockLine],
        reference_id: Uuid,
        user_id: Uuid,
        reference_type: Option<StockReference>,
    ) -> AppResult<Vec<StockMovementRecord>> {
        let reference = reference_type.unwrap_or(StockReference::Sale);
        let mut movements = Vec::with_capacity(items.len());
        for item in items {
            let movement = self
                .apply_movement(
                    &mut *conn,
                    company_id,
                    warehouse_id,
                    item,
                    MovementKind::Out,
                    Some(reference),
                    Some(reference_id),
                    None,
                    user_id,
                )
                .await?;
            movements.push(movement);
        }
        Ok(movements)
    }

    /// Record an IN movement and increment the balance for every item,
    /// within the caller's transaction. Symmetric to
    /// [`Self::register_stock_exit`].
    pub async fn register_stock_entry(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        warehouse_id: Uuid,
        items: &[StockLine],
        reference_id: Uuid,
        user_id: Uuid,
        reference_type: Option<StockReference>,
    ) -> AppResult<Vec<StockMovementRecord>> {
        let reference = reference_type.unwrap_or(StockReference::Sale);
        let mut movements = Vec::with_capacity(items.len());
        for item in items {
            let movement = self
                .apply_movement(
                    &mut *conn,
                    company_id,
                    warehouse_id,
                    item,
                    MovementKind::In,
                    Some(reference),
                    Some(reference_id),
                    None,
                    user_id,
                )
                .await?;
            movements.push(movement);
        }
        Ok(movements)
    }

    /// Move stock between two warehouses of the same company.
    ///
    /// Produces exactly one OUT movement at the source and one IN movement
    /// at the destination, sharing a generated reference id, inside one
    /// transaction.
    pub async fn transfer_stock(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: TransferStockInput,
    ) -> AppResult<StockTransfer> {
        if input.from_warehouse_id == input.to_warehouse_id {
            return Err(AppError::Validation {
                field: "to_warehouse_id".to_string(),
                message: "Source and destination warehouses must differ".to_string(),
            });
        }
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        self.ensure_warehouse(company_id, input.from_warehouse_id)
            .await?;
        self.ensure_warehouse(company_id, input.to_warehouse_id)
            .await?;
        self.ensure_product(company_id, input.product_id).await?;

        let available = self
            .get_balance(company_id, input.product_id, input.from_warehouse_id)
            .await?;
        if input.quantity > available {
            return Err(AppError::InsufficientStock {
                product_id: input.product_id,
                requested: input.quantity,
                available,
            });
        }

        let reference_id = Uuid::new_v4();
        let line = StockLine {
            product_id: input.product_id,
            quantity: input.quantity,
        };

        let mut tx = self.db.begin().await?;

        let outbound = self
            .apply_movement(
                &mut *tx,
                company_id,
                input.from_warehouse_id,
                &line,
                MovementKind::Out,
                Some(StockReference::Transfer),
                Some(reference_id),
                input.notes.as_deref(),
                user_id,
            )
            .await?;

        let inbound = self
            .apply_movement(
                &mut *tx,
                company_id,
                input.to_warehouse_id,
                &line,
                MovementKind::In,
                Some(StockReference::Transfer),
                Some(reference_id),
                input.notes.as_deref(),
                user_id,
            )
            .await?;

        tx.commit().await?;

        Ok(StockTransfer {
            reference_id,
            outbound,
            inbound,
        })
    }

    /// Record a manual stock adjustment. OUT adjustments must not take the
    /// balance below zero; manual movements carry no reference type.
    pub async fn create_adjustment(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateAdjustmentInput,
    ) -> AppResult<StockMovementRecord> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        self.ensure_warehouse(company_id, input.warehouse_id).await?;
        self.ensure_product(company_id, input.product_id).await?;

        if input.kind == MovementKind::Out {
            let available = self
                .get_balance(company_id, input.product_id, input.warehouse_id)
                .await?;
            if input.quantity > available {
                return Err(AppError::InsufficientStock {
                    product_id: input.product_id,
                    requested: input.quantity,
                    available,
                });
            }
        }

        let line = StockLine {
            product_id: input.product_id,
            quantity: input.quantity,
        };

        let mut tx = self.db.begin().await?;

        let movement = self
            .apply_movement(
                &mut *tx,
                company_id,
                input.warehouse_id,
                &line,
                input.kind,
                None,
                None,
                input.notes.as_deref(),
                user_id,
            )
            .await?;

        tx.commit().await?;

        Ok(movement)
    }

    /// Current balance for a (product, warehouse) pair; zero if no row exists
    pub async fn get_balance(
        &self,
        company_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<Decimal> {
        let quantity = sqlx::query_scalar::<_, Decimal>(
            "SELECT quantity FROM stock_balances WHERE company_id = $1 AND product_id = $2 AND warehouse_id = $3"
        )
        .bind(company_id)
        .bind(product_id)
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(quantity.unwrap_or(Decimal::ZERO))
    }

    /// List all balances held at a warehouse
    pub async fn list_warehouse_balances(
        &self,
        company_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<Vec<WarehouseBalance>> {
        self.ensure_warehouse(company_id, warehouse_id).await?;

        let balances = sqlx::query_as::<_, WarehouseBalance>(
            r#"
            SELECT sb.product_id, p.name AS product_name, p.sku, sb.warehouse_id,
                   sb.quantity, sb.updated_at
            FROM stock_balances sb
            JOIN products p ON p.id = sb.product_id
            WHERE sb.company_id = $1 AND sb.warehouse_id = $2
            ORDER BY p.name
            "#,
        )
        .bind(company_id)
        .bind(warehouse_id)
        .fetch_all(&self.db)
        .await?;

        Ok(balances)
    }

    /// A product's stock position: the sum of its balances across warehouses
    pub async fn get_product_stock(
        &self,
        company_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductStock> {
        self.ensure_product(company_id, product_id).await?;

        let by_warehouse = sqlx::query_as::<_, ProductWarehouseBalance>(
            r#"
            SELECT sb.warehouse_id, w.name AS warehouse_name, sb.quantity
            FROM stock_balances sb
            JOIN warehouses w ON w.id = sb.warehouse_id
            WHERE sb.company_id = $1 AND sb.product_id = $2
            ORDER BY w.name
            "#,
        )
        .bind(company_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        let total = by_warehouse.iter().map(|b| b.quantity).sum();

        Ok(ProductStock {
            product_id,
            total,
            by_warehouse,
        })
    }

    /// Movement history, newest first
    pub async fn list_movements(
        &self,
        company_id: Uuid,
        filter: MovementFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<StockMovementRecord>> {
        let movements = sqlx::query_as::<_, StockMovementRecord>(
            r#"
            SELECT id, company_id, product_id, warehouse_id, kind, quantity,
                   reference_type, reference_id, notes, created_by, created_at
            FROM stock_movements
            WHERE company_id = $1
              AND ($2::uuid IS NULL OR product_id = $2)
              AND ($3::uuid IS NULL OR warehouse_id = $3)
              AND ($4::uuid IS NULL OR reference_id = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(company_id)
        .bind(filter.product_id)
        .bind(filter.warehouse_id)
        .bind(filter.reference_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Append one movement and apply its balance delta. The single write
    /// path for stock: a movement row is created exactly once per balance
    /// change.
    #[allow(clippy::too_many_arguments)]
    async fn apply_movement(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        warehouse_id: Uuid,
        line: &StockLine,
        kind: MovementKind,
        reference_type: Option<StockReference>,
        reference_id: Option<Uuid>,
        notes: Option<&str>,
        user_id: Uuid,
    ) -> AppResult<StockMovementRecord> {
        validate_quantity(line.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;

        let movement = sqlx::query_as::<_, StockMovementRecord>(
            r#"
            INSERT INTO stock_movements (company_id, product_id, warehouse_id, kind, quantity,
                                         reference_type, reference_id, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, company_id, product_id, warehouse_id, kind, quantity,
                      reference_type, reference_id, notes, created_by, created_at
            "#,
        )
        .bind(company_id)
        .bind(line.product_id)
        .bind(warehouse_id)
        .bind(kind.as_str())
        .bind(line.quantity)
        .bind(reference_type.map(|r| r.as_str()))
        .bind(reference_id)
        .bind(notes)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        self.apply_balance_delta(conn, company_id, line.product_id, warehouse_id, kind.signed(line.quantity))
            .await?;

        Ok(movement)
    }

    /// Apply a signed delta to the materialized balance as a single atomic
    /// upsert-with-increment. Never read-modify-write: two requests hitting
    /// the same (product, warehouse) key serialize inside the database.
    async fn apply_balance_delta(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        product_id: Uuid,
        warehouse_id: Uuid,
        delta: Decimal,
    ) -> AppResult<Decimal> {
        let quantity = sqlx::query_scalar::<_, Decimal>(
            r#"
            INSERT INTO stock_balances (company_id, product_id, warehouse_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (product_id, warehouse_id)
            DO UPDATE SET quantity = stock_balances.quantity + EXCLUDED.quantity,
                          updated_at = NOW()
            RETURNING quantity
            "#,
        )
        .bind(company_id)
        .bind(product_id)
        .bind(warehouse_id)
        .bind(delta)
        .fetch_one(&mut *conn)
        .await?;

        Ok(quantity)
    }

    /// Validate the warehouse belongs to the company
    async fn ensure_warehouse(&self, company_id: Uuid, warehouse_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM warehouses WHERE id = $1 AND company_id = $2)",
        )
        .bind(warehouse_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Warehouse".to_string()));
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
