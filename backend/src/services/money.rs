//! Money ledger service
//!
//! Records IN/OUT cash movements tagged by their originating operation.
//! Entries created by a sale or purchase are system-owned: the only way to
//! remove their effect is to reverse the originating operation, which
//! writes a compensating entry under the same reference id.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::models::{MoneyKind, MoneyReference, PaymentMethod};
use shared::types::Pagination;
use shared::validation::validate_amount;

use crate::error::{AppError, AppResult};

/// Money ledger service
#[derive(Clone)]
pub struct MoneyService {
    db: PgPool,
}

/// A money category
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MoneyCategoryRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A recorded money movement
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MoneyMovementRecord {
    pub id: Uuid,
    pub company_id: Uuid,
    pub kind: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub category_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub occurred_on: NaiveDate,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a money category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
}

/// Input for renaming a money category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: String,
}

/// Input for recording a manual money movement
#[derive(Debug, Deserialize)]
pub struct CreateMoneyMovementInput {
    pub kind: MoneyKind,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub category_id: Option<Uuid>,
    pub notes: Option<String>,
    pub occurred_on: Option<NaiveDate>,
}

/// Input for updating a manual money movement
#[derive(Debug, Deserialize)]
pub struct UpdateMoneyMovementInput {
    pub amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub category_id: Option<Uuid>,
    pub notes: Option<String>,
    pub occurred_on: Option<NaiveDate>,
}

/// Filters for listing money movements
#[derive(Debug, Default, Deserialize)]
pub struct MoneyMovementFilter {
    pub kind: Option<MoneyKind>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl MoneyService {
    /// Create a new MoneyService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a money category; names are unique per company
    pub async fn create_category(
        &self,
        company_id: Uuid,
        input: CreateCategoryInput,
    ) -> AppResult<MoneyCategoryRecord> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Category name cannot be empty".to_string(),
            });
        }

        sqlx::query_as::<_, MoneyCategoryRecord>(
            r#"
            INSERT INTO money_categories (company_id, name)
            VALUES ($1, $2)
            RETURNING id, company_id, name, created_at
            "#,
        )
        .bind(company_id)
        .bind(name)
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

    /// List money categories for a company
    pub async fn list_categories(&self, company_id: Uuid) -> AppResult<Vec<MoneyCategoryRecord>> {
        let categories = sqlx::query_as::<_, MoneyCategoryRecord>(
            "SELECT id, company_id, name, created_at FROM money_categories WHERE company_id = $1 ORDER BY name",
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(categories)
    }

    /// Rename a money category
    pub async fn update_category(
        &self,
        company_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> AppResult<MoneyCategoryRecord> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Category name cannot be empty".to_string(),
            });
        }

        sqlx::query_as::<_, MoneyCategoryRecord>(
            r#"
            UPDATE money_categories
            SET name = $1
            WHERE id = $2 AND company_id = $3
            RETURNING id, company_id, name, created_at
            "#,
        )
        .bind(name)
        .bind(category_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateName(name.to_string());
                }
            }
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound("Money category".to_string()))
    }

    /// Delete a money category. Movements keep their history; the FK sets
    /// their category to null.
    pub async fn delete_category(&self, company_id: Uuid, category_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM money_categories WHERE id = $1 AND company_id = $2")
            .bind(category_id)
            .bind(company_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Money category".to_string()));
        }

        Ok(())
    }

    /// Record a manual money movement. Manual entries never carry a
    /// reference type.
    pub async fn create_movement(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        input: CreateMoneyMovementInput,
    ) -> AppResult<MoneyMovementRecord> {
        validate_amount(input.amount).map_err(|msg| AppError::Validation {
            field: "amount".to_string(),
            message: msg.to_string(),
        })?;

        if let Some(category_id) = input.category_id {
            self.ensure_category(company_id, category_id).await?;
        }

        let occurred_on = input
            .occurred_on
            .unwrap_or_else(|| Utc::now().date_naive());

        let movement = sqlx::query_as::<_, MoneyMovementRecord>(
            r#"
            INSERT INTO money_movements (company_id, kind, amount, payment_method, category_id,
                                         notes, occurred_on, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, company_id, kind, amount, payment_method, category_id,
                      reference_type, reference_id, notes, occurred_on, created_by, created_at
            "#,
        )
        .bind(company_id)
        .bind(input.kind.as_str())
        .bind(input.amount)
        .bind(input.payment_method.as_str())
        .bind(input.category_id)
        .bind(&input.notes)
        .bind(occurred_on)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(movement)
    }

    /// Get a money movement
    pub async fn get_movement(
        &self,
        company_id: Uuid,
        movement_id: Uuid,
    ) -> AppResult<MoneyMovementRecord> {
        sqlx::query_as::<_, MoneyMovementRecord>(
            r#"
            SELECT id, company_id, kind, amount, payment_method, category_id,
                   reference_type, reference_id, notes, occurred_on, created_by, created_at
            FROM money_movements
            WHERE id = $1 AND company_id = $2
            "#,
        )
        .bind(movement_id)
        .bind(company_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Money movement".to_string()))
    }

    /// List money movements, newest first
    pub async fn list_movements(
        &self,
        company_id: Uuid,
        filter: MoneyMovementFilter,
        pagination: Pagination,
    ) -> AppResult<Vec<MoneyMovementRecord>> {
        let movements = sqlx::query_as::<_, MoneyMovementRecord>(
            r#"
            SELECT id, company_id, kind, amount, payment_method, category_id,
                   reference_type, reference_id, notes, occurred_on, created_by, created_at
            FROM money_movements
            WHERE company_id = $1
              AND ($2::text IS NULL OR kind = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::date IS NULL OR occurred_on >= $4)
              AND ($5::date IS NULL OR occurred_on <= $5)
            ORDER BY occurred_on DESC, created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(company_id)
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.category_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Update a money movement. System-owned entries are refused: the
    /// originating sale or purchase must be reversed instead.
    pub async fn update_movement(
        &self,
        company_id: Uuid,
        movement_id: Uuid,
        input: UpdateMoneyMovementInput,
    ) -> AppResult<MoneyMovementRecord> {
        let existing = self.get_movement(company_id, movement_id).await?;

        if let Some(origin) = protected_origin(existing.reference_type.as_deref()) {
            return Err(AppError::ProtectedRecord { origin });
        }

        let amount = input.amount.unwrap_or(existing.amount);
        validate_amount(amount).map_err(|msg| AppError::Validation {
            field: "amount".to_string(),
            message: msg.to_string(),
        })?;

        let category_id = input.category_id.or(existing.category_id);
        if let Some(category_id) = input.category_id {
            self.ensure_category(company_id, category_id).await?;
        }

        let payment_method = input
            .payment_method
            .map(|m| m.as_str().to_string())
            .unwrap_or(existing.payment_method);
        let notes = input.notes.or(existing.notes);
        let occurred_on = input.occurred_on.unwrap_or(existing.occurred_on);

        let movement = sqlx::query_as::<_, MoneyMovementRecord>(
            r#"
            UPDATE money_movements
            SET amount = $1, payment_method = $2, category_id = $3, notes = $4, occurred_on = $5
            WHERE id = $6
            RETURNING id, company_id, kind, amount, payment_method, category_id,
                      reference_type, reference_id, notes, occurred_on, created_by, created_at
            "#,
        )
        .bind(amount)
        .bind(&payment_method)
        .bind(category_id)
        .bind(&notes)
        .bind(occurred_on)
        .bind(movement_id)
        .fetch_one(&self.db)
        .await?;

        Ok(movement)
    }

    /// Delete a money movement. System-owned entries are refused the same
    /// way as updates.
    pub async fn delete_movement(&self, company_id: Uuid, movement_id: Uuid) -> AppResult<()> {
        let existing = self.get_movement(company_id, movement_id).await?;

        if let Some(origin) = protected_origin(existing.reference_type.as_deref()) {
            return Err(AppError::ProtectedRecord { origin });
        }

        sqlx::query("DELETE FROM money_movements WHERE id = $1")
            .bind(movement_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Append a system-owned entry inside the caller's transaction. Used
    /// by the sale and purchase orchestration; these entries are the ones
    /// the protected-record rule guards.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn record_system_movement(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        user_id: Uuid,
        kind: MoneyKind,
        amount: Decimal,
        payment_method: &str,
        reference: MoneyReference,
        reference_id: Uuid,
    ) -> AppResult<MoneyMovementRecord> {
        validate_amount(amount).map_err(|msg| AppError::Validation {
            field: "amount".to_string(),
            message: msg.to_string(),
        })?;

        let movement = sqlx::query_as::<_, MoneyMovementRecord>(
            r#"
            INSERT INTO money_movements (company_id, kind, amount, payment_method,
                                         reference_type, reference_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, company_id, kind, amount, payment_method, category_id,
                      reference_type, reference_id, notes, occurred_on, created_by, created_at
            "#,
        )
        .bind(company_id)
        .bind(kind.as_str())
        .bind(amount)
        .bind(payment_method)
        .bind(reference.as_str())
        .bind(reference_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(movement)
    }

    /// Payment method of the original system entry for a reference, used
    /// when writing its compensating entry
    pub(crate) async fn reference_payment_method(
        &self,
        company_id: Uuid,
        reference: MoneyReference,
        reference_id: Uuid,
        kind: MoneyKind,
    ) -> AppResult<Option<String>> {
        let method = sqlx::query_scalar::<_, String>(
            r#"
            SELECT payment_method FROM money_movements
            WHERE company_id = $1 AND reference_type = $2 AND reference_id = $3 AND kind = $4
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(company_id)
        .bind(reference.as_str())
        .bind(reference_id)
        .bind(kind.as_str())
        .fetch_optional(&self.db)
        .await?;

        Ok(method)
    }

    /// Validate the category belongs to the company
    async fn ensure_category(&self, company_id: Uuid, category_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM money_categories WHERE id = $1 AND company_id = $2)",
        )
        .bind(category_id)
        .bind(company_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Money category".to_string()));
        }
        Ok(())
    }
}

/// The owning origin (e.g. "SALE") if the reference type marks a
/// system-owned entry
fn protected_origin(reference_type: Option<&str>) -> Option<String> {
    let reference = reference_type.and_then(MoneyReference::from_str);
    if MoneyReference::is_protected(reference) {
        reference.map(|r| r.as_str().to_uppercase())
    } else {
        None
    }
}
