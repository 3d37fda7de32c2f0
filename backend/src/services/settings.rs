//! Per-company settings service
//!
//! Settings are an explicit key-value map, not a schema-bound profile:
//! tenants extend their configuration without migrations. Updates follow
//! the shallow-merge contract defined in `shared::validation::shallow_merge`:
//! provided keys overwrite stored keys, absent keys persist, and an
//! explicit JSON `null` deletes a key.

use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;

/// Company settings service
#[derive(Clone)]
pub struct SettingsService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct SettingRow {
    key: String,
    value: Value,
}

impl SettingsService {
    /// Create a new SettingsService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// The stored settings map for a company
    pub async fn get_settings(&self, company_id: Uuid) -> AppResult<Map<String, Value>> {
        let rows = sqlx::query_as::<_, SettingRow>(
            "SELECT key, value FROM company_settings WHERE company_id = $1 ORDER BY key",
        )
        .bind(company_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|row| (row.key, row.value)).collect())
    }

    /// Shallow-merge the patch over the stored settings and return the
    /// merged map. Each provided key upserts (or deletes, for `null`)
    /// inside one transaction, so a patch applies fully or not at all.
    pub async fn update_settings(
        &self,
        company_id: Uuid,
        patch: Map<String, Value>,
    ) -> AppResult<Map<String, Value>> {
        let mut tx = self.db.begin().await?;

        for (key, value) in &patch {
            if value.is_null() {
                sqlx::query("DELETE FROM company_settings WHERE company_id = $1 AND key = $2")
                    .bind(company_id)
                    .bind(key)
                    .execute(&mut *tx)
                    .await?;
            } else {
                sqlx::query(
                    r#"
                    INSERT INTO company_settings (company_id, key, value)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (company_id, key)
                    DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                    "#,
                )
                .bind(company_id)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_settings(company_id).await
    }
}
