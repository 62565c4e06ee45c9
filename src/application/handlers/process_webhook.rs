//! ProcessWebhookHandler - verifies and applies payment processor webhooks.
//!
//! Deliveries are at-least-once, unordered and possibly duplicated, so the
//! handler routes every paid confirmation through the store's atomic
//! mark-paid entry point, where redelivery becomes a harmless no-op.

use std::sync::Arc;

use crate::domain::checkout::PayableType;
use crate::domain::foundation::{EntryId, MarkPaid, OrderId};
use crate::domain::webhook::{
    CheckoutSessionObject, PaymentEvent, PaymentEventKind, WebhookError, WebhookSignatureVerifier,
};
use crate::ports::{EntryRepository, Notifier, OrderRepository};

use super::spawn_notification;

/// Command carrying the exact raw bytes received and the signature header.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub payload: Vec<u8>,
    pub signature: String,
}

/// Successful webhook outcomes. All of them mean "do not redeliver".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A paid transition was applied.
    Processed,
    /// The entity was already paid; the redelivery changed nothing.
    AlreadyApplied,
    /// The event kind carries no action here (payment-intent notifications
    /// and unrecognized kinds).
    Ignored,
}

/// Handler for inbound payment webhooks.
pub struct ProcessWebhookHandler {
    verifier: WebhookSignatureVerifier,
    entries: Arc<dyn EntryRepository>,
    orders: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: WebhookSignatureVerifier,
        entries: Arc<dyn EntryRepository>,
        orders: Arc<dyn OrderRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            verifier,
            entries,
            orders,
            notifier,
        }
    }

    /// Verifies the signature over the raw bytes, then dispatches on the
    /// event kind. Nothing mutates state before verification succeeds.
    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, &cmd.signature)?;

        tracing::info!(event_id = %event.id, event_type = %event.event_type, "received webhook");

        match event.kind() {
            PaymentEventKind::CheckoutCompleted => self.apply_checkout_completed(&event).await,
            PaymentEventKind::PaymentSucceeded => {
                // The checkout-completed event carries the action; this one
                // is informational.
                tracing::info!(event_id = %event.id, "payment succeeded");
                Ok(WebhookOutcome::Ignored)
            }
            PaymentEventKind::PaymentFailed => {
                // A paid entity is never moved backward by webhook; pending
                // entities stay pending so the customer can retry checkout.
                tracing::warn!(event_id = %event.id, "payment failed");
                Ok(WebhookOutcome::Ignored)
            }
            PaymentEventKind::Unrecognized(event_type) => {
                tracing::debug!(event_id = %event.id, event_type = %event_type, "unhandled webhook event type");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn apply_checkout_completed(
        &self,
        event: &PaymentEvent,
    ) -> Result<WebhookOutcome, WebhookError> {
        let session = event.checkout_session()?;
        let payment_intent = session.require_payment_intent()?.to_string();

        match session.payable_type() {
            Some(PayableType::Entry) => {
                let entry_id = self.resolve_entry(&session).await?;
                self.mark_entry_paid(&entry_id, &payment_intent).await
            }
            Some(PayableType::Order) => {
                let order_id = self.resolve_order(&session).await?;
                self.mark_order_paid(&order_id, &payment_intent).await
            }
            None => {
                // Metadata absent or foreign: the session id is still a
                // unique correlation key across both record sets.
                if let Some(entry) = self.entries.find_by_session_id(&session.id).await? {
                    self.mark_entry_paid(&entry.id, &payment_intent).await
                } else if let Some(order) = self.orders.find_by_session_id(&session.id).await? {
                    self.mark_order_paid(&order.id, &payment_intent).await
                } else {
                    Err(WebhookError::EntityNotFound(session.id.clone()))
                }
            }
        }
    }

    async fn resolve_entry(
        &self,
        session: &CheckoutSessionObject,
    ) -> Result<EntryId, WebhookError> {
        match session.internal_id() {
            Some(raw) => raw
                .parse()
                .map_err(|_| WebhookError::ParseError(format!("invalid entry id: {}", raw))),
            None => {
                let entry = self
                    .entries
                    .find_by_session_id(&session.id)
                    .await?
                    .ok_or_else(|| WebhookError::EntityNotFound(session.id.clone()))?;
                Ok(entry.id)
            }
        }
    }

    async fn resolve_order(
        &self,
        session: &CheckoutSessionObject,
    ) -> Result<OrderId, WebhookError> {
        match session.internal_id() {
            Some(raw) => raw
                .parse()
                .map_err(|_| WebhookError::ParseError(format!("invalid order id: {}", raw))),
            None => {
                let order = self
                    .orders
                    .find_by_session_id(&session.id)
                    .await?
                    .ok_or_else(|| WebhookError::EntityNotFound(session.id.clone()))?;
                Ok(order.id)
            }
        }
    }

    async fn mark_entry_paid(
        &self,
        id: &EntryId,
        payment_intent: &str,
    ) -> Result<WebhookOutcome, WebhookError> {
        let (outcome, entry) = self.entries.mark_paid(id, payment_intent).await?;
        match outcome {
            MarkPaid::Applied => {
                tracing::info!(entry_id = %entry.id, "entry payment completed");
                let notifier = Arc::clone(&self.notifier);
                spawn_notification("entry_paid", async move {
                    notifier.entry_paid(&entry).await
                });
                Ok(WebhookOutcome::Processed)
            }
            MarkPaid::AlreadyPaid => {
                tracing::info!(entry_id = %entry.id, "entry already paid, redelivery ignored");
                Ok(WebhookOutcome::AlreadyApplied)
            }
        }
    }

    async fn mark_order_paid(
        &self,
        id: &OrderId,
        payment_intent: &str,
    ) -> Result<WebhookOutcome, WebhookError> {
        let (outcome, order) = self.orders.mark_paid(id, payment_intent).await?;
        match outcome {
            MarkPaid::Applied => {
                tracing::info!(order_number = %order.order_number, "order payment completed");
                let notifier = Arc::clone(&self.notifier);
                spawn_notification("order_paid", async move {
                    notifier.order_paid(&order).await
                });
                Ok(WebhookOutcome::Processed)
            }
            MarkPaid::AlreadyPaid => {
                tracing::info!(order_number = %order.order_number, "order already paid, redelivery ignored");
                Ok(WebhookOutcome::AlreadyApplied)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use serde_json::json;

    use crate::adapters::memory::{InMemoryEntryRepository, InMemoryOrderRepository};
    use crate::application::handlers::test_support::{
        settle_notifications, CountingNotifier, MockCheckoutGateway,
    };
    use crate::application::handlers::{
        CreateEntryCommand, CreateEntryHandler, CreateOrderCommand, CreateOrderHandler,
    };
    use crate::domain::entry::{CompetitionEvent, PaymentStatus};
    use crate::domain::order::{DeliveryMethod, OrderStatus};
    use crate::domain::pricing::Pricing;
    use crate::domain::webhook::compute_test_signature;

    const SECRET: &str = "whsec_test_secret_12345";
    const FRONTEND: &str = "https://nationalninesgolf.co.uk";

    struct Fixture {
        entries: Arc<InMemoryEntryRepository>,
        orders: Arc<InMemoryOrderRepository>,
        gateway: Arc<MockCheckoutGateway>,
        notifier: Arc<CountingNotifier>,
        handler: ProcessWebhookHandler,
    }

    fn fixture() -> Fixture {
        let entries = Arc::new(InMemoryEntryRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let gateway = Arc::new(MockCheckoutGateway::new());
        let notifier = Arc::new(CountingNotifier::default());
        let handler = ProcessWebhookHandler::new(
            WebhookSignatureVerifier::new(SecretString::new(SECRET.to_string())),
            entries.clone(),
            orders.clone(),
            notifier.clone(),
        );
        Fixture {
            entries,
            orders,
            gateway,
            notifier,
            handler,
        }
    }

    fn signed(payload: &str) -> ProcessWebhookCommand {
        let timestamp = chrono::Utc::now().timestamp();
        ProcessWebhookCommand {
            payload: payload.as_bytes().to_vec(),
            signature: compute_test_signature(SECRET, timestamp, payload.as_bytes()),
        }
    }

    fn checkout_completed_payload(
        session_id: &str,
        payment_intent: &str,
        metadata: serde_json::Value,
    ) -> String {
        json!({
            "id": format!("evt_{}", session_id),
            "type": "checkout.session.completed",
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": session_id,
                    "payment_intent": payment_intent,
                    "metadata": metadata
                }
            },
            "livemode": false
        })
        .to_string()
    }

    async fn seeded_entry(f: &Fixture) -> crate::domain::entry::Entry {
        let handler = CreateEntryHandler::new(
            f.entries.clone(),
            f.gateway.clone(),
            f.notifier.clone(),
            Pricing::default(),
            FRONTEND,
        );
        handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath"),
            })
            .await
            .unwrap()
            .entry
    }

    async fn seeded_order(f: &Fixture) -> crate::domain::order::Order {
        let handler = CreateOrderHandler::new(
            f.orders.clone(),
            f.gateway.clone(),
            f.notifier.clone(),
            Pricing::default(),
            FRONTEND,
        );
        handler
            .handle(CreateOrderCommand {
                draft: crate::domain::order::test_draft(
                    DeliveryMethod::Shipping,
                    vec![
                        crate::domain::order::test_item("cap", 2, Decimal::new(1000, 2)),
                        crate::domain::order::test_item("towel", 1, Decimal::new(1500, 2)),
                    ],
                ),
            })
            .await
            .unwrap()
            .order
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Gate
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invalid_signature_never_mutates_state() {
        let f = fixture();
        let entry = seeded_entry(&f).await;

        let payload = checkout_completed_payload(
            "cs_test_1",
            "pi_attack",
            json!({ "type": "entry", "internal_id": entry.id.to_string(), "secondary_key": "KENT" }),
        );
        let cmd = ProcessWebhookCommand {
            payload: payload.as_bytes().to_vec(),
            signature: format!("t={},v1={}", chrono::Utc::now().timestamp(), "ab".repeat(32)),
        };

        let result = f.handler.handle(cmd).await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        let stored = f.entries.find_by_id(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
        assert!(stored.payment_intent_id.is_none());
    }

    #[tokio::test]
    async fn malformed_header_never_mutates_state() {
        let f = fixture();
        let entry = seeded_entry(&f).await;

        let payload = checkout_completed_payload(
            "cs_test_1",
            "pi_attack",
            json!({ "type": "entry", "internal_id": entry.id.to_string() }),
        );
        let cmd = ProcessWebhookCommand {
            payload: payload.as_bytes().to_vec(),
            signature: "garbage".to_string(),
        };

        let result = f.handler.handle(cmd).await;

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
        let stored = f.entries.find_by_id(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
    }

    // ══════════════════════════════════════════════════════════════
    // Checkout Completed - Entries
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_completed_marks_entry_paid() {
        let f = fixture();
        let entry = seeded_entry(&f).await;

        let payload = checkout_completed_payload(
            "cs_test_1",
            "pi_123",
            json!({ "type": "entry", "internal_id": entry.id.to_string(), "secondary_key": "KENT" }),
        );
        let outcome = f.handler.handle(signed(&payload)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let stored = f.entries.find_by_id(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.payment_intent_id.as_deref(), Some("pi_123"));
        assert!(stored.paid_at.is_some());
    }

    #[tokio::test]
    async fn redelivered_checkout_completed_is_a_noop_with_no_duplicate_side_effects() {
        let f = fixture();
        let entry = seeded_entry(&f).await;

        let payload = checkout_completed_payload(
            "cs_test_1",
            "pi_123",
            json!({ "type": "entry", "internal_id": entry.id.to_string(), "secondary_key": "KENT" }),
        );

        let first = f.handler.handle(signed(&payload)).await.unwrap();
        let second = f.handler.handle(signed(&payload)).await.unwrap();
        settle_notifications().await;

        assert_eq!(first, WebhookOutcome::Processed);
        assert_eq!(second, WebhookOutcome::AlreadyApplied);
        assert_eq!(f.notifier.entry_paid.load(Ordering::SeqCst), 1);

        let stored = f.entries.find_by_id(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn checkout_completed_for_cancelled_entry_is_a_conflict() {
        let f = fixture();
        let entry = seeded_entry(&f).await;
        f.entries
            .update_status(&entry.id, PaymentStatus::Cancelled)
            .await
            .unwrap();

        let payload = checkout_completed_payload(
            "cs_test_1",
            "pi_123",
            json!({ "type": "entry", "internal_id": entry.id.to_string() }),
        );
        let result = f.handler.handle(signed(&payload)).await;

        let err = result.unwrap_err();
        assert!(matches!(err, WebhookError::InvalidTransition(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn falls_back_to_session_lookup_when_internal_id_absent() {
        let f = fixture();
        let entry = seeded_entry(&f).await;
        let session_id = entry.checkout_session_id.clone().unwrap();

        let payload =
            checkout_completed_payload(&session_id, "pi_456", json!({ "type": "entry" }));
        let outcome = f.handler.handle(signed(&payload)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let stored = f.entries.find_by_id(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn falls_back_across_both_record_sets_when_metadata_missing() {
        let f = fixture();
        let order = seeded_order(&f).await;
        let session_id = order.checkout_session_id.clone().unwrap();

        let payload = checkout_completed_payload(&session_id, "pi_789", json!({}));
        let outcome = f.handler.handle(signed(&payload)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn unknown_session_is_a_retryable_miss() {
        let f = fixture();

        let payload = checkout_completed_payload("cs_unknown", "pi_000", json!({}));
        let err = f.handler.handle(signed(&payload)).await.unwrap_err();

        assert!(matches!(err, WebhookError::EntityNotFound(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn missing_payment_intent_is_rejected_without_retry() {
        let f = fixture();
        let entry = seeded_entry(&f).await;

        let payload = json!({
            "id": "evt_no_intent",
            "type": "checkout.session.completed",
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "metadata": { "type": "entry", "internal_id": entry.id.to_string() }
                }
            },
            "livemode": false
        })
        .to_string();

        let err = f.handler.handle(signed(&payload)).await.unwrap_err();
        assert!(matches!(err, WebhookError::MissingField("payment_intent")));
        assert!(!err.is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Other Event Kinds
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn payment_intent_events_are_acknowledged_without_action() {
        let f = fixture();
        let entry = seeded_entry(&f).await;

        for event_type in ["payment_intent.succeeded", "payment_intent.payment_failed"] {
            let payload = json!({
                "id": "evt_intent",
                "type": event_type,
                "created": chrono::Utc::now().timestamp(),
                "data": { "object": { "id": "pi_123" } },
                "livemode": false
            })
            .to_string();

            let outcome = f.handler.handle(signed(&payload)).await.unwrap();
            assert_eq!(outcome, WebhookOutcome::Ignored);
        }

        let stored = f.entries.find_by_id(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn payment_failed_after_payment_leaves_entity_paid() {
        let f = fixture();
        let entry = seeded_entry(&f).await;
        f.entries.mark_paid(&entry.id, "pi_123").await.unwrap();

        let payload = json!({
            "id": "evt_late_failure",
            "type": "payment_intent.payment_failed",
            "created": chrono::Utc::now().timestamp(),
            "data": { "object": { "id": "pi_123" } },
            "livemode": false
        })
        .to_string();

        let outcome = f.handler.handle(signed(&payload)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
        let stored = f.entries.find_by_id(&entry.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn unrecognized_kinds_are_acknowledged_without_error() {
        let f = fixture();

        let payload = json!({
            "id": "evt_other",
            "type": "charge.dispute.created",
            "created": chrono::Utc::now().timestamp(),
            "data": { "object": {} },
            "livemode": false
        })
        .to_string();

        let outcome = f.handler.handle(signed(&payload)).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    // ══════════════════════════════════════════════════════════════
    // End to End
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn order_checkout_end_to_end() {
        let f = fixture();

        // qty 2 @ £10 + qty 1 @ £15, shipped: subtotal £35, shipping £10.
        let order = seeded_order(&f).await;
        assert_eq!(order.subtotal, Decimal::new(3500, 2));
        assert_eq!(order.shipping_cost, Decimal::new(1000, 2));
        assert_eq!(order.total, Decimal::new(4500, 2));

        // The checkout session carried the metadata the webhook now echoes.
        let request = &f.gateway.requests.lock().unwrap()[0];
        let metadata = json!({
            "type": request.metadata.payable_type.as_str(),
            "internal_id": request.metadata.internal_id,
            "secondary_key": request.metadata.secondary_key,
        });

        let session_id = order.checkout_session_id.clone().unwrap();
        let payload = checkout_completed_payload(&session_id, "pi_e2e", metadata);
        let outcome = f.handler.handle(signed(&payload)).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Processed);
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.payment_intent_id.as_deref(), Some("pi_e2e"));
        assert!(stored.paid_at.is_some());
    }

    #[tokio::test]
    async fn concurrent_duplicate_deliveries_apply_exactly_once() {
        let f = fixture();
        let entry = seeded_entry(&f).await;

        let payload = checkout_completed_payload(
            "cs_test_1",
            "pi_dup",
            json!({ "type": "entry", "internal_id": entry.id.to_string() }),
        );

        let handler = Arc::new(f.handler);
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let handler = Arc::clone(&handler);
            let cmd = signed(&payload);
            tasks.push(tokio::spawn(async move { handler.handle(cmd).await }));
        }

        let mut applied = 0;
        for task in tasks {
            match task.await.unwrap().unwrap() {
                WebhookOutcome::Processed => applied += 1,
                WebhookOutcome::AlreadyApplied => {}
                WebhookOutcome::Ignored => panic!("unexpected ignore"),
            }
        }
        settle_notifications().await;

        assert_eq!(applied, 1);
        assert_eq!(f.notifier.entry_paid.load(Ordering::SeqCst), 1);
    }
}
