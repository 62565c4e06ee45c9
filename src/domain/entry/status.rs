//! Entry payment status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, StateMachine};

/// Payment status of a competition entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Created, awaiting payment confirmation.
    Pending,
    /// Payment confirmed by the processor or recorded manually.
    Paid,
    /// Payment failed. Requires manual reconciliation.
    Failed,
    /// Paid entry refunded administratively.
    Refunded,
    /// Entry withdrawn before payment completed.
    Cancelled,
}

impl PaymentStatus {
    /// Canonical storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a stored status value.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            "CANCELLED" => Ok(PaymentStatus::Cancelled),
            other => Err(DomainError::database(format!(
                "invalid payment status value: {}",
                other
            ))),
        }
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Pending, Paid) | (Pending, Failed) | (Pending, Cancelled) | (Paid, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Pending => vec![Paid, Failed, Cancelled],
            Paid => vec![Refunded],
            Failed => vec![],
            Refunded => vec![],
            Cancelled => vec![],
        }
    }
}
