//! Sale lifecycle service
//!
//! Sales are completed transactions: creating one exits stock, records the
//! payments, and writes the money-in entry in the same transaction.
//! Cancellation reverses both sides: the item quantities come back to the
//! warehouse and a compensating money-out entry neutralizes the original
//! money-in, so a canceled sale nets to zero in both ledgers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

use shared::models::{MoneyKind, MoneyReference, PaymentMethod, SaleStatus};
use shared::types::Pagination;
use shared::validation::{compute_totals, payment_fits, settle_payment_status, validate_amount};

use crate::error::{AppError, AppResult};
use crate::services::money::MoneyService;
use crate::services::stock::{StockLine, StockService};

/// Sale lifecycle service
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    stock: StockService,
    money: MoneyService,
}

/// A sale header row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub warehouse_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sale line with the cost snapshot taken at sale time
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SaleItemRecord {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub base_price: Decimal,
    pub cost: Decimal,
    pub total: Decimal,
}

/// A payment recorded against a sale
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalePaymentRecord {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

/// A sale with its items and payments
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: SaleRecord,
    pub items: Vec<SaleItemRecord>,
    pub payments: Vec<SalePaymentRecord>,
}

/// One requested line in a sale
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    /// Unit price override; falls back to the product's list price
    pub base_price: Option<Decimal>,
}

/// A payment collected with the sale
#[derive(Debug, Clone, Deserialize)]
pub struct SalePaymentInput {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

/// Input for creating a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub warehouse_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub items: Vec<SaleLineInput>,
    pub payments: Vec<SalePaymentInput>,
    pub discount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Input for canceling a sale
#[derive(Debug, Default, Deserialize)]
pub struct CancelSaleInput {
    /// Return the stock to a different warehouse than the one it left
    pub warehouse_id: Option<Uuid>,
}

/// Input for recording a payment on a partially-paid sale
#[derive(Debug, Deserialize)]
pub struct AddSalePaymentInput {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

/// Product data loaded for sale line validation
#[derive(Debug, FromRow)]
struct ProductLineRow {
    id: Uuid,
    is_active: bool,
    price: Decimal,
    cost: Decimal,
    available: Decimal,
}

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool) -> Self {
        let stock = StockService::new(db.clone());
        let money = MoneyService::new(db.clone());
        Self { db, stock, money }
    }

    /// Create a sale in COMPLETED state.
    ///
    /// The sale, its items, the stock exit for every item, the payment
    /// rows, and the money-in entry for the sale total all commit in one
    /// transaction or not at all.
    pub async fn create_sale(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateSaleInput,
    ) -> AppResult<SaleDetail> {
        if input.items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "A sale needs at least one item".to_string(),
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
        let lines: Vec<(Decimal, Decimal)> = input
            .items
            .iter()
            .map(|item| {
                let unit_price = item
                    .base_price
                    .unwrap_or_else(|| {
                        products
                            .get(&item.product_id)
                            .map(|p| p.price)
                            .unwrap_or(Decimal::ZERO)
                    });
                (item.quantity, unit_price)
            })
            .collect();
        let totals = compute_totals(&lines, discount, Decimal::ZERO).map_err(|msg| {
            AppError::Validation {
                field: "totals".to_string(),
                message: msg.to_string(),
            }
        })?;

        let mut paid = Decimal::ZERO;
        for payment in &input.payments {
            validate_amount(payment.amount).map_err(|msg| AppError::Validation {
                field: "payments".to_string(),
                message: msg.to_string(),
            })?;
            if !payment_fits(totals.total, paid, payment.amount) {
                return Err(AppError::PaymentExceedsTotal {
                    total: totals.total,
                    attempted: paid + payment.amount,
                });
            }
            paid += payment.amount;
        }

        let payment_method = input
            .payments
            .first()
            .map(|p| p.payment_method)
            .unwrap_or(PaymentMethod::Cash);

        let mut tx = self.db.begin().await?;

        let sale_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO sales (company_id, warehouse_id, customer_id, payment_status,
                               subtotal, discount, total, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(company_id)
        .bind(input.warehouse_id)
        .bind(input.customer_id)
        .bind(settle_payment_status(totals.total, paid).as_str())
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.total)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut stock_lines = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| AppError::NotFound(format!("Product {}", item.product_id)))?;
            let unit_price = item.base_price.unwrap_or(product.price);

            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, base_price, cost, total)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(sale_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(unit_price)
            .bind(product.cost)
            .bind(item.quantity * unit_price)
            .execute(&mut *tx)
            .await?;

            stock_lines.push(StockLine {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }

        // Stock ledger exit; the reference type defaults to SALE
        self.stock
            .register_stock_exit(
                &mut *tx,
                company_id,
                input.warehouse_id,
                &stock_lines,
                sale_id,
                user_id,
                None,
            )
            .await?;

        for payment in &input.payments {
            sqlx::query(
                "INSERT INTO sale_payments (sale_id, amount, payment_method) VALUES ($1, $2, $3)",
            )
            .bind(sale_id)
            .bind(payment.amount)
            .bind(payment.payment_method.as_str())
            .execute(&mut *tx)
            .await?;
        }

        // Money-in for the sale total, tagged with the sale's id
        self.money
            .record_system_movement(
                &mut *tx,
                company_id,
                user_id,
                MoneyKind::In,
                totals.total,
                payment_method.as_str(),
                MoneyReference::Sale,
                sale_id,
            )
            .await?;

        tx.commit().await?;

        self.get_sale(company_id, sale_id).await
    }

    /// Get a sale with its items and payments
    pub async fn get_sale(&self, company_id: Uuid, sale_id: Uuid) -> AppResult<SaleDetail> {
        let sale = self.get_sale_row(company_id, sale_id).await?;

        let items = sqlx::query_as::<_, SaleItemRecord>(
            r#"
            SELECT id, sale_id, product_id, quantity, base_price, cost, total
            FROM sale_items
            WHERE sale_id = $1
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        let payments = sqlx::query_as::<_, SalePaymentRecord>(
            r#"
            SELECT id, sale_id, amount, payment_method, created_at
            FROM sale_payments
            WHERE sale_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleDetail {
            sale,
            items,
            payments,
        })
    }

    /// List sales for a company, newest first
    pub async fn list_sales(
        &self,
        company_id: Uuid,
        status: Option<SaleStatus>,
        pagination: Pagination,
    ) -> AppResult<Vec<SaleRecord>> {
        let sales = sqlx::query_as::<_, SaleRecord>(
            r#"
            SELECT id, company_id, warehouse_id, customer_id, status, payment_status,
                   subtotal, discount, total, notes, created_by, created_at, updated_at
            FROM sales
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

        Ok(sales)
    }

    /// Cancel a completed sale.
    ///
    /// Returns every item quantity to the sale's warehouse (or an override
    /// warehouse), flips the sale to CANCELED with payment status PENDING,
    /// and writes the compensating money-out entry, all in one
    /// transaction. Canceling twice fails on the second call.
    pub async fn cancel_sale(
        &self,
        company_id: Uuid,
        sale_id: Uuid,
        user_id: Uuid,
        input: CancelSaleInput,
    ) -> AppResult<SaleDetail> {
        let sale = self.get_sale_row(company_id, sale_id).await?;
        let status = parse_status(&sale.status)?;
        if status == SaleStatus::Canceled {
            return Err(AppError::AlreadyCanceled("Sale".to_string()));
        }

        let warehouse_id = match input.warehouse_id {
            Some(warehouse_id) => {
                self.ensure_warehouse(company_id, warehouse_id).await?;
                warehouse_id
            }
            None => sale.warehouse_id,
        };

        let lines = sqlx::query_as::<_, StockLine>(
            "SELECT product_id, quantity FROM sale_items WHERE sale_id = $1",
        )
        .bind(sale_id)
        .fetch_all(&self.db)
        .await?;

        // The compensating entry mirrors the original entry's method
        let payment_method = self
            .money
            .reference_payment_method(company_id, MoneyReference::Sale, sale_id, MoneyKind::In)
            .await?
            .unwrap_or_else(|| PaymentMethod::Cash.as_str().to_string());

        let mut tx = self.db.begin().await?;

        self.stock
            .register_stock_entry(
                &mut *tx,
                company_id,
                warehouse_id,
                &lines,
                sale_id,
                user_id,
                None,
            )
            .await?;

        sqlx::query(
            "UPDATE sales SET status = $1, payment_status = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(SaleStatus::Canceled.as_str())
        .bind(shared::models::PaymentStatus::Pending.as_str())
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        // Neutralize the original money-in so the canceled sale nets to
        // zero in the money ledger
        self.money
            .record_system_movement(
                &mut *tx,
                company_id,
                user_id,
                MoneyKind::Out,
                sale.total,
                &payment_method,
                MoneyReference::Sale,
                sale_id,
            )
            .await?;

        tx.commit().await?;

        self.get_sale(company_id, sale_id).await
    }

    /// Record a payment against a partially-paid sale, capped by its total
    pub async fn add_sale_payment(
        &self,
        company_id: Uuid,
        sale_id: Uuid,
        input: AddSalePaymentInput,
    ) -> AppResult<SaleDetail> {
        validate_amount(input.amount).map_err(|msg| AppError::Validation {
            field: "amount".to_string(),
            message: msg.to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        // Lock the sale row so concurrent payments serialize on the cap check
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT total FROM sales WHERE id = $1 AND company_id = $2 FOR UPDATE",
        )
        .bind(sale_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let paid = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM sale_payments WHERE sale_id = $1",
        )
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        if !payment_fits(total, paid, input.amount) {
            return Err(AppError::PaymentExceedsTotal {
                total,
                attempted: paid + input.amount,
            });
        }

        sqlx::query(
            "INSERT INTO sale_payments (sale_id, amount, payment_method) VALUES ($1, $2, $3)",
        )
        .bind(sale_id)
        .bind(input.amount)
        .bind(input.payment_method.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE sales SET payment_status = $1, updated_at = NOW() WHERE id = $2")
            .bind(settle_payment_status(total, paid + input.amount).as_str())
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_sale(company_id, sale_id).await
    }

    async fn get_sale_row(&self, company_id: Uuid, sale_id: Uuid) -> AppResult<SaleRecord> {
        sqlx::query_as::<_, SaleRecord>(
            r#"
            SELECT id, company_id, warehouse_id, customer_id, status, payment_status,
                   subtotal, discount, total, notes, created_by, created_at, updated_at
            FROM sales
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(sale_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// Load products referenced by the requested lines together with their
    /// availability at the target warehouse
    async fn load_product_lines(
        &self,
        company_id: Uuid,
        warehouse_id: Uuid,
        items: &[SaleLineInput],
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
fn parse_status(status: &str) -> AppResult<SaleStatus> {
    SaleStatus::from_str(status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("invalid sale status in database: {status}"))
    })
}

/// Requested quantities per product may not exceed the available balance
fn check_availability(
    items: &[SaleLineInput],
    products: &BTreeMap<Uuid, ProductLineRow>,
) -> AppResult<()> {
    let mut requested: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for item in items {
        *requested.entry(item.product_id).or_default() += item.quantity;
    }

    for (product_id, quantity) in requested {
        let product = products
            .get(&product_id)
            .ok_or_else(|| AppError::NotFound(format!("Product {}", product_id)))?;
        if quantity > product.available {
            return Err(AppError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.available,
            });
        }
    }
    Ok(())
}
