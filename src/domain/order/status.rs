//! Order status state machine covering payment and fulfilment.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, StateMachine};

/// Lifecycle status of a shop order.
///
/// Payment moves PENDING to PAID via the reconciliation entry point;
/// fulfilment then progresses under administrative control. CANCELLED and
/// REFUNDED are reachable administratively from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Collected,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Canonical storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Collected => "COLLECTED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }

    /// Parses a stored status value.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAID" => Ok(OrderStatus::Paid),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "COLLECTED" => Ok(OrderStatus::Collected),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            "REFUNDED" => Ok(OrderStatus::Refunded),
            other => Err(DomainError::database(format!(
                "invalid order status value: {}",
                other
            ))),
        }
    }

    /// True once payment has been applied to this order, in PAID or any
    /// later fulfilment state. Redelivered payment confirmations for these
    /// states are no-ops.
    pub fn payment_applied(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid
                | OrderStatus::Processing
                | OrderStatus::Shipped
                | OrderStatus::Delivered
                | OrderStatus::Collected
        )
    }

    /// True when entering this status completes fulfilment.
    pub fn is_fulfilment(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Collected)
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            // Payment
            (Pending, Paid)
            // Fulfilment progression
                | (Paid, Processing)
                | (Processing, Shipped)
                | (Processing, Collected)
                | (Shipped, Delivered)
            // Administrative escape hatch from any non-terminal state
                | (Pending, Cancelled)
                | (Pending, Refunded)
                | (Paid, Cancelled)
                | (Paid, Refunded)
                | (Processing, Cancelled)
                | (Processing, Refunded)
                | (Shipped, Cancelled)
                | (Shipped, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Paid, Cancelled, Refunded],
            Paid => vec![Processing, Cancelled, Refunded],
            Processing => vec![Shipped, Collected, Cancelled, Refunded],
            Shipped => vec![Delivered, Cancelled, Refunded],
            Delivered => vec![],
            Collected => vec![],
            Cancelled => vec![],
            Refunded => vec![],
        }
    }
}
