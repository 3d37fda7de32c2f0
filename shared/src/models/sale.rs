//! Sale lifecycle rules

use serde::{Deserialize, Serialize};

/// Sale status. Sales are created completed; the only transition is
/// completed -> canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Canceled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(SaleStatus::Completed),
            "canceled" => Some(SaleStatus::Canceled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(
            SaleStatus::from_str(SaleStatus::Completed.as_str()),
            Some(SaleStatus::Completed)
        );
        assert_eq!(
            SaleStatus::from_str(SaleStatus::Canceled.as_str()),
            Some(SaleStatus::Canceled)
        );
        assert_eq!(SaleStatus::from_str("refunded"), None);
    }
}
