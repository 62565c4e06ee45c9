//! Error types for the domain layer.

use thiserror::Error;

/// Standard domain error, tagged by kind so the boundary layer can map each
/// failure to external signaling without transport knowledge.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Malformed or out-of-range input, rejected before persistence.
    #[error("field '{field}' is invalid: {reason}")]
    Validation { field: String, reason: String },

    /// Event value is not one of the recognized competitions.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A club may enter each competition at most once.
    #[error("club '{club_name}' has already entered {event}")]
    DuplicateEntry { event: String, club_name: String },

    /// Lookup miss.
    #[error("{resource} not found: {key}")]
    NotFound { resource: &'static str, key: String },

    /// Attempted state transition is not permitted by the lifecycle rules.
    #[error("cannot transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Outbound call to the payment processor failed.
    #[error("payment gateway failure: {0}")]
    PaymentGateway(String),

    /// Generated order number already exists. Never silently regenerated.
    #[error("order number collision: {0}")]
    OrderNumberCollision(String),

    /// Durable store operation failed.
    #[error("database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not-found error for the given resource and key.
    pub fn not_found(resource: &'static str, key: impl Into<String>) -> Self {
        DomainError::NotFound {
            resource,
            key: key.into(),
        }
    }

    /// Creates a database error from any displayable source.
    pub fn database(source: impl std::fmt::Display) -> Self {
        DomainError::Database(source.to_string())
    }

    /// Returns true for faults of the durable store, which the caller may
    /// treat as transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Database(_))
    }
}
