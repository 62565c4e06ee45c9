//! Checkout gateway port for the external payment processor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::checkout::CheckoutSessionRequest;
use crate::domain::foundation::DomainError;

/// Hosted checkout session returned by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Processor's session id, the correlation key stored on the entity.
    pub id: String,

    /// URL the customer is redirected to for payment.
    pub url: String,
}

/// Failure of the outbound checkout-session call.
///
/// The core never retries these automatically; the end user re-initiates
/// checkout. The retryable flag only informs the boundary's messaging.
#[derive(Debug, Clone, Error)]
#[error("payment gateway error: {message}")]
pub struct PaymentGatewayError {
    pub message: String,
    /// Whether a later identical attempt could plausibly succeed
    /// (network fault or processor 5xx, as opposed to a rejected request).
    pub retryable: bool,
}

impl PaymentGatewayError {
    /// Transport-level failure (connect, timeout).
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// Processor rejected the request.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

impl From<PaymentGatewayError> for DomainError {
    fn from(err: PaymentGatewayError) -> Self {
        DomainError::PaymentGateway(err.message)
    }
}

/// Port for creating hosted checkout sessions.
///
/// No lock may be held across a call: the processor can be slow and must
/// not block unrelated requests.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Submits a checkout session request, returning the session id and
    /// redirect URL.
    async fn create_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn CheckoutGateway) {}
    }

    #[test]
    fn network_errors_are_retryable() {
        assert!(PaymentGatewayError::network("timed out").retryable);
        assert!(!PaymentGatewayError::rejected("bad currency").retryable);
    }

    #[test]
    fn converts_to_domain_error() {
        let err: DomainError = PaymentGatewayError::network("connection refused").into();
        assert!(matches!(err, DomainError::PaymentGateway(ref m) if m.contains("refused")));
    }
}
