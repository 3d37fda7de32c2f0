//! Activity log service
//!
//! Append-only persisted log of who did what, fronted by a bounded
//! in-process ring buffer for fast recent-activity reads. The buffer is
//! warmed from the table at startup and appended on every record; it is
//! owned by this service; there is no ambient module state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::types::Pagination;

use crate::error::AppResult;

/// How many entries the recent-activity cache holds across all tenants
const RECENT_CAPACITY: usize = 256;

/// One recorded activity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Activity log service
#[derive(Clone)]
pub struct ActivityLogService {
    db: PgPool,
    recent: Arc<RwLock<VecDeque<ActivityEntry>>>,
}

impl ActivityLogService {
    /// Create the service and warm the ring buffer from the persisted log.
    /// Called once at startup.
    pub async fn load(db: PgPool) -> AppResult<Self> {
        let mut rows = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, company_id, user_id, action, entity_type, entity_id, created_at
            FROM activity_log
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(RECENT_CAPACITY as i64)
        .fetch_all(&db)
        .await?;

        // Oldest first so push_back keeps chronological order
        rows.reverse();

        Ok(Self {
            db,
            recent: Arc::new(RwLock::new(VecDeque::from(rows))),
        })
    }

    /// Append an entry to the persisted log and the ring buffer
    pub async fn record(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
    ) -> AppResult<ActivityEntry> {
        let entry = sqlx::query_as::<_, ActivityEntry>(
            r#"
            INSERT INTO activity_log (company_id, user_id, action, entity_type, entity_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_id, user_id, action, entity_type, entity_id, created_at
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .fetch_one(&self.db)
        .await?;

        let mut recent = self.recent.write().await;
        if recent.len() == RECENT_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(entry.clone());

        Ok(entry)
    }

    /// Recent activity for a company, newest first, served from the ring
    /// buffer without touching the database
    pub async fn recent(&self, company_id: Uuid) -> Vec<ActivityEntry> {
        self.recent
            .read()
            .await
            .iter()
            .rev()
            .filter(|entry| entry.company_id == company_id)
            .cloned()
            .collect()
    }

    /// Full history from the persisted log, newest first
    pub async fn history(
        &self,
        company_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, company_id, user_id, action, entity_type, entity_id, created_at
            FROM activity_log
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

        Ok(entries)
    }
}
