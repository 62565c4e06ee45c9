//! Payment processor webhook events.
//!
//! Only the fields this system acts on are captured; the rest of the
//! processor's event schema is carried opaquely in `data.object`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::WebhookError;
use crate::domain::checkout::{PayableType, META_INTERNAL_ID, META_SECONDARY_KEY, META_TYPE};

/// Webhook event envelope as delivered by the payment processor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEvent {
    /// Unique event identifier (evt_xxx format).
    pub id: String,

    /// Raw event type string (e.g. "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp at which the event was created.
    pub created: i64,

    /// Event-specific payload.
    pub data: PaymentEventData,

    /// Whether this is a live mode event.
    #[serde(default)]
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentEventData {
    /// The object that triggered the event (shape depends on the kind).
    pub object: serde_json::Value,
}

/// The closed set of event kinds this system recognizes.
///
/// Matched exhaustively everywhere, so adding a kind is a
/// compile-time-visible change. Anything else lands in the explicit
/// `Unrecognized` arm and is acknowledged without processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    /// Hosted checkout session completed; carries the paying entity's
    /// correlation metadata and the payment-intent id.
    CheckoutCompleted,
    /// A payment intent succeeded.
    PaymentSucceeded,
    /// A payment intent failed.
    PaymentFailed,
    /// Any other event type.
    Unrecognized(String),
}

impl PaymentEventKind {
    /// Parses the processor's event type string.
    pub fn from_event_type(s: &str) -> Self {
        match s {
            "checkout.session.completed" => PaymentEventKind::CheckoutCompleted,
            "payment_intent.succeeded" => PaymentEventKind::PaymentSucceeded,
            "payment_intent.payment_failed" => PaymentEventKind::PaymentFailed,
            other => PaymentEventKind::Unrecognized(other.to_string()),
        }
    }
}

impl PaymentEvent {
    /// Classifies the event into the recognized kind set.
    pub fn kind(&self) -> PaymentEventKind {
        PaymentEventKind::from_event_type(&self.event_type)
    }

    /// Deserializes the data object as a checkout session.
    pub fn checkout_session(&self) -> Result<CheckoutSessionObject, WebhookError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| WebhookError::ParseError(format!("invalid checkout session: {}", e)))
    }
}

/// Checkout session object as it arrives in `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutSessionObject {
    /// Session identifier (cs_xxx format).
    pub id: String,

    /// Payment-intent identifier settled by this session.
    pub payment_intent: Option<String>,

    /// Customer email used during checkout.
    pub customer_email: Option<String>,

    /// Correlation metadata attached at session creation.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    /// Payable type from the correlation metadata, if present and valid.
    pub fn payable_type(&self) -> Option<PayableType> {
        self.metadata.get(META_TYPE).and_then(|t| PayableType::parse(t))
    }

    /// Internal entity id from the correlation metadata.
    pub fn internal_id(&self) -> Option<&str> {
        self.metadata.get(META_INTERNAL_ID).map(String::as_str)
    }

    /// Secondary lookup key (event name or order number).
    pub fn secondary_key(&self) -> Option<&str> {
        self.metadata.get(META_SECONDARY_KEY).map(String::as_str)
    }

    /// The payment-intent id, required to record the payment.
    pub fn require_payment_intent(&self) -> Result<&str, WebhookError> {
        self.payment_intent
            .as_deref()
            .ok_or(WebhookError::MissingField("payment_intent"))
    }
}
