//! Warehouse master data service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Warehouse service
#[derive(Clone)]
pub struct WarehouseService {
    db: PgPool,
}

/// A warehouse row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WarehouseRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a warehouse
#[derive(Debug, Deserialize)]
pub struct CreateWarehouseInput {
    pub name: String,
    pub address: Option<String>,
}

/// Input for updating a warehouse
#[derive(Debug, Deserialize)]
pub struct UpdateWarehouseInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl WarehouseService {
    /// Create a new WarehouseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a warehouse; names are unique per company
    pub async fn create_warehouse(
        &self,
        company_id: Uuid,
        input: CreateWarehouseInput,
    ) -> AppResult<WarehouseRecord> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Warehouse name cannot be empty".to_string(),
            });
        }

        sqlx::query_as::<_, WarehouseRecord>(
            r#"
            INSERT INTO warehouses (company_id, name, address)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, name, address, is_active, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(name)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateName(name.to_string());
                }
            }
            e.into()
        })
    }

    /// Get a warehouse
    pub async fn get_warehouse(
        &self,
        company_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<WarehouseRecord> {
        sqlx::query_as::<_, WarehouseRecord>(
            r#"
            SELECT id, company_id, name, address, is_active, created_at, updated_at
            FROM warehouses
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(warehouse_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }

    /// List warehouses for a company
    pub async fn list_warehouses(&self, company_id: Uuid) -> AppResult<Vec<WarehouseRecord>> {
        let warehouses = sqlx::query_as::<_, WarehouseRecord>(
            r#"
            SELECT id, company_id, name, address, is_active, created_at, updated_at
            FROM warehouses
            WHERE company_id = $1
            ORDER BY name
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(warehouses)
    }

    /// Update a warehouse
    pub async fn update_warehouse(
        &self,
        company_id: Uuid,
        warehouse_id: Uuid,
        input: UpdateWarehouseInput,
    ) -> AppResult<WarehouseRecord> {
        let existing = self.get_warehouse(company_id, warehouse_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let address = input.address.or(existing.address);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        sqlx::query_as::<_, WarehouseRecord>(
            r#"
            UPDATE warehouses
            SET name = $1, address = $2, is_active = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING id, company_id, name, address, is_active, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&address)
        .bind(is_active)
        .bind(warehouse_id)
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

    /// Deactivate a warehouse instead of deleting it; its movement history
    /// must stay reconcilable
    pub async fn deactivate_warehouse(
        &self,
        company_id: Uuid,
        warehouse_id: Uuid,
    ) -> AppResult<WarehouseRecord> {
        sqlx::query_as::<_, WarehouseRecord>(
            r#"
            UPDATE warehouses
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND company_id = $2
            RETURNING id, company_id, name, address, is_active, created_at, updated_at
            "#,
        )
        .bind(warehouse_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))
    }
}
