//! Customer master data service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::types::Pagination;

use crate::error::{AppError, AppResult};

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// A customer row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a customer
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a customer
    pub async fn create_customer(
        &self,
        company_id: Uuid,
        input: CreateCustomerInput,
    ) -> AppResult<CustomerRecord> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Customer name cannot be empty".to_string(),
            });
        }

        let customer = sqlx::query_as::<_, CustomerRecord>(
            r#"
            INSERT INTO customers (company_id, name, phone, email, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_id, name, phone, email, notes, created_at, updated_at
            "#,
        )
        .bind(company_id)
        .bind(name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    /// Get a customer
    pub async fn get_customer(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
    ) -> AppResult<CustomerRecord> {
        sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, company_id, name, phone, email, notes, created_at, updated_at
            FROM customers
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(customer_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }

    /// List customers for a company
    pub async fn list_customers(
        &self,
        company_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<Vec<CustomerRecord>> {
        let customers = sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT id, company_id, name, phone, email, notes, created_at, updated_at
            FROM customers
            WHERE company_id = $1
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    /// Update a customer
    pub async fn update_customer(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<CustomerRecord> {
        let existing = self.get_customer(company_id, customer_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let phone = input.phone.or(existing.phone);
        let email = input.email.or(existing.email);
        let notes = input.notes.or(existing.notes);

        let customer = sqlx::query_as::<_, CustomerRecord>(
            r#"
            UPDATE customers
            SET name = $1, phone = $2, email = $3, notes = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING id, company_id, name, phone, email, notes, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&phone)
        .bind(&email)
        .bind(&notes)
        .bind(customer_id)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }
}
