//! Product master data service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

use crate::error::{AppError, AppResult};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// A product row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product with its total stock across warehouses
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithStock {
    #[serde(flatten)]
    pub product: ProductRecord,
    pub total_stock: Decimal,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Option<Decimal>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product; sku and name are unique per company
    pub async fn create_product(
        &self,
        company_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<ProductRecord> {
        let sku = input.sku.trim();
        let name = input.name.trim();
        if sku.is_empty() || name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "SKU and name cannot be empty".to_string(),
            });
        }
        if input.price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "price".to_string(),
                message: "Price cannot be negative".to_string(),
            });
        }
        let cost = input.cost.unwrap_or(Decimal::ZERO);
        if cost < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "cost".to_string(),
                message: "Cost cannot be negative".to_string(),
            });
        }

        sqlx::query_as::<_, ProductRecord>(
            r#"
            INSERT INTO products (company_id, sku, name, description, price, cost)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, company_id, sku, name, description, price, cost, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(sku)
        .bind(name)
        .bind(&input.description)
        .bind(input.price)
        .bind(cost)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("sku") {
                        return AppError::DuplicateName(sku.to_string());
                    }
                    return AppError::DuplicateName(name.to_string());
                }
            }
            e.into()
        })
    }

    /// Get a product with its total stock across warehouses
    pub async fn get_product(
        &self,
        company_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductWithStock> {
        let product = sqlx::query_as::<_, ProductRecord>(
            r#"
            SELECT id, company_id, sku, name, description, price, cost, is_active,
                   created_at, updated_at
            FROM products
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(product_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let total_stock = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(quantity), 0) FROM stock_balances WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(ProductWithStock {
            product,
            total_stock,
        })
    }

    /// List products for a company, with pagination metadata
    pub async fn list_products(
        &self,
        company_id: Uuid,
        include_inactive: bool,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<ProductRecord>> {
        let total_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE company_id = $1 AND ($2 OR is_active)",
        )
        .bind(company_id)
        .bind(include_inactive)
        .fetch_one(&self.db)
        .await?;

        let products = sqlx::query_as::<_, ProductRecord>(
            r#"
            SELECT id, company_id, sku, name, description, price, cost, is_active,
                   created_at, updated_at
            FROM products
            WHERE company_id = $1
              AND ($2 OR is_active)
            ORDER BY name
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(company_id)
        .bind(include_inactive)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: products,
            pagination: PaginationMeta::new(pagination, total_items as u64),
        })
    }

    /// Update a product
    pub async fn update_product(
        &self,
        company_id: Uuid,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<ProductRecord> {
        let existing = sqlx::query_as::<_, ProductRecord>(
            r#"
            SELECT id, company_id, sku, name, description, price, cost, is_active,
                   created_at, updated_at
            FROM products
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(product_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let price = input.price.unwrap_or(existing.price);
        let cost = input.cost.unwrap_or(existing.cost);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        if price < Decimal::ZERO || cost < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "price".to_string(),
                message: "Price and cost cannot be negative".to_string(),
            });
        }

        sqlx::query_as::<_, ProductRecord>(
            r#"
            UPDATE products
            SET name = $1, description = $2, price = $3, cost = $4, is_active = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING id, company_id, sku, name, description, price, cost, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&description)
        .bind(price)
        .bind(cost)
        .bind(is_active)
        .bind(product_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateName(name.clone());
                }
            }
            e.into()
        })
    }

    /// Deactivate a product. Products are never deleted: their movement
    /// history must stay reconcilable.
    pub async fn deactivate_product(
        &self,
        company_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductRecord> {
        sqlx::query_as::<_, ProductRecord>(
            r#"
            UPDATE products
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING id, company_id, sku, name, description, price, cost, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(product_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }
}
