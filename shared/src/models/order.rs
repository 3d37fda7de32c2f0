//! Order lifecycle rules

use serde::{Deserialize, Serialize};

/// Order status in the fulfillment chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "delivered" => Some(OrderStatus::Delivered),
            "canceled" => Some(OrderStatus::Canceled),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    /// States in which the order's items have been exited from stock.
    /// Stock leaves at CONFIRMED and stays out until delivery or return.
    pub fn holds_stock(&self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed | OrderStatus::Preparing | OrderStatus::Ready
        )
    }

    /// Whether the fulfillment chain allows moving from `self` to `next`.
    /// Forward movement is one step at a time; cancellation is reachable
    /// from any non-terminal state.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == OrderStatus::Canceled {
            return true;
        }
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Confirmed, OrderStatus::Preparing)
                | (OrderStatus::Preparing, OrderStatus::Ready)
                | (OrderStatus::Ready, OrderStatus::Delivered)
        )
    }
}

/// Payment status for orders and sales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Open,
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Open => "open",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(PaymentStatus::Open),
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    #[test]
    fn forward_chain_is_one_step_at_a_time() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Delivered));

        // Skipping a step is not allowed
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));

        // Neither is moving backward
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn cancel_reachable_from_every_non_terminal_state() {
        for status in ALL {
            if status.is_terminal() {
                assert!(!status.can_transition_to(OrderStatus::Canceled));
            } else {
                assert!(status.can_transition_to(OrderStatus::Canceled));
            }
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for next in ALL {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Canceled.can_transition_to(next));
        }
    }

    #[test]
    fn stock_is_held_between_confirm_and_delivery() {
        assert!(!OrderStatus::Pending.holds_stock());
        assert!(OrderStatus::Confirmed.holds_stock());
        assert!(OrderStatus::Preparing.holds_stock());
        assert!(OrderStatus::Ready.holds_stock());
        assert!(!OrderStatus::Delivered.holds_stock());
        assert!(!OrderStatus::Canceled.holds_stock());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in ALL {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("shipped"), None);
    }
}
