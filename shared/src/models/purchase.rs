//! Purchase lifecycle rules

use serde::{Deserialize, Serialize};

/// Purchase status. Purchases are created received; the only transition
/// is received -> canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Received,
    Canceled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Received => "received",
            PurchaseStatus::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "received" => Some(PurchaseStatus::Received),
            "canceled" => Some(PurchaseStatus::Canceled),
            _ => None,
        }
    }
}
