//! HTTP handlers for the Retail Inventory Management Platform

mod activity;
mod customer;
mod health;
mod money;
mod order;
mod product;
mod purchase;
mod sale;
mod settings;
mod stock;
mod warehouse;

pub use activity::*;
pub use customer::*;
pub use health::*;
pub use money::*;
pub use order::*;
pub use product::*;
pub use purchase::*;
pub use sale::*;
pub use settings::*;
pub use stock::*;
pub use warehouse::*;

use crate::middleware::AuthUser;
use crate::AppState;
use uuid::Uuid;

/// Record an activity entry for a mutation that already committed. A
/// failure here must not fail the request; it is logged instead.
pub(crate) async fn log_activity(
    state: &AppState,
    user: &AuthUser,
    action: &str,
    entity_type: &str,
    entity_id: Option<Uuid>,
) {
    if let Err(err) = state
        .activity
        .record(user.company_id, user.user_id, action, entity_type, entity_id)
        .await
    {
        tracing::warn!("Failed to record activity for {}: {}", action, err);
    }
}
