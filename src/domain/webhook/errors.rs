//! Webhook error types.
//!
//! Every failure maps to one of three caller-visible outcomes: processed
//! (2xx, do not retry), malformed or unauthenticated (4xx, do not retry),
//! transient (5xx, retry later). The external sender owns all retrying.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed. Must never mutate state.
    #[error("invalid signature")]
    InvalidSignature,

    /// Event timestamp is outside the replay window.
    #[error("timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or payload.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from the event.
    #[error("missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Required field missing from the event payload.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Referenced payable entity could not be found.
    #[error("payable entity not found: {0}")]
    EntityNotFound(String),

    /// The paid transition is not valid from the entity's current state.
    /// Requires manual reconciliation; the sender must not redeliver.
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    /// Durable store operation failed.
    #[error("database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the sender should retry delivering this webhook.
    ///
    /// Retryable errors indicate temporary failures that may succeed on a
    /// later attempt (store faults, eventual consistency on lookups).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_) | WebhookError::EntityNotFound(_)
        )
    }

    /// Maps the error to the HTTP status that drives the sender's retry
    /// behavior: 4xx never retries, 5xx retries later.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Auth failures - don't retry
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }

            // Malformed input - don't retry
            WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingMetadata(_)
            | WebhookError::MissingField(_) => StatusCode::BAD_REQUEST,

            // Manual reconciliation needed - don't retry
            WebhookError::InvalidTransition(_) => StatusCode::CONFLICT,

            // Transient - sender retries
            WebhookError::EntityNotFound(_) | WebhookError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { key, .. } => WebhookError::EntityNotFound(key),
            DomainError::InvalidTransition { from, to } => {
                WebhookError::InvalidTransition(format!("{} -> {}", from, to))
            }
            DomainError::Database(msg) => WebhookError::Database(msg),
            other => WebhookError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Retryability
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn database_errors_are_retryable() {
        assert!(WebhookError::Database("connection lost".to_string()).is_retryable());
    }

    #[test]
    fn entity_not_found_is_retryable() {
        // Eventual consistency: the entity may be visible on redelivery.
        assert!(WebhookError::EntityNotFound("abc".to_string()).is_retryable());
    }

    #[test]
    fn auth_and_parse_failures_are_not_retryable() {
        assert!(!WebhookError::InvalidSignature.is_retryable());
        assert!(!WebhookError::TimestampOutOfRange.is_retryable());
        assert!(!WebhookError::ParseError("bad json".to_string()).is_retryable());
        assert!(!WebhookError::MissingMetadata("internal_id").is_retryable());
    }

    #[test]
    fn invalid_transition_is_not_retryable() {
        // Redelivery can never make a terminal state payable again.
        assert!(!WebhookError::InvalidTransition("CANCELLED -> PAID".to_string()).is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Status Codes
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn signature_failures_return_unauthorized() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn malformed_input_returns_bad_request() {
        assert_eq!(
            WebhookError::ParseError("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::MissingField("payment_intent").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::InvalidTimestamp.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn invalid_transition_returns_conflict() {
        assert_eq!(
            WebhookError::InvalidTransition("x".to_string()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn transient_failures_return_internal_error() {
        assert_eq!(
            WebhookError::EntityNotFound("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::Database("x".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn retryable_errors_map_to_5xx_and_vice_versa() {
        let errors = [
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
            WebhookError::ParseError("x".to_string()),
            WebhookError::MissingMetadata("m"),
            WebhookError::MissingField("f"),
            WebhookError::EntityNotFound("e".to_string()),
            WebhookError::InvalidTransition("t".to_string()),
            WebhookError::Database("d".to_string()),
        ];
        for err in errors {
            assert_eq!(
                err.is_retryable(),
                err.status_code().is_server_error(),
                "{:?} retryability must match its status class",
                err
            );
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Domain Error Conversion
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn not_found_converts_to_entity_not_found() {
        let err: WebhookError = DomainError::not_found("entry", "abc").into();
        assert!(matches!(err, WebhookError::EntityNotFound(ref k) if k == "abc"));
    }

    #[test]
    fn invalid_transition_converts_with_states() {
        let err: WebhookError = DomainError::InvalidTransition {
            from: "Cancelled".to_string(),
            to: "Paid".to_string(),
        }
        .into();
        assert!(matches!(err, WebhookError::InvalidTransition(ref s) if s.contains("Cancelled")));
    }
}
