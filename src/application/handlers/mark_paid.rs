//! Manual payment handlers for bank transfers taken outside checkout.
//!
//! Both route through the same store mark-paid entry point as the webhook
//! path, so the idempotency and transition rules are never duplicated.

use std::sync::Arc;

use crate::domain::entry::Entry;
use crate::domain::foundation::{DomainError, EntryId, MarkPaid, OrderId};
use crate::domain::order::Order;
use crate::ports::{EntryRepository, Notifier, OrderRepository};

use super::spawn_notification;

/// Reference recorded in place of a payment-intent id for manual payments.
pub const MANUAL_PAYMENT_REFERENCE: &str = "MANUAL_PAYMENT";

/// Command to record a manual payment against an entry.
#[derive(Debug, Clone)]
pub struct MarkEntryPaidCommand {
    pub id: EntryId,
}

/// Handler recording manual entry payments.
pub struct MarkEntryPaidHandler {
    entries: Arc<dyn EntryRepository>,
    notifier: Arc<dyn Notifier>,
}

impl MarkEntryPaidHandler {
    pub fn new(entries: Arc<dyn EntryRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { entries, notifier }
    }

    pub async fn handle(&self, cmd: MarkEntryPaidCommand) -> Result<Entry, DomainError> {
        let (outcome, entry) = self
            .entries
            .mark_paid(&cmd.id, MANUAL_PAYMENT_REFERENCE)
            .await?;

        if outcome.was_applied() {
            tracing::info!(entry_id = %entry.id, "entry marked paid manually");
            let notifier = Arc::clone(&self.notifier);
            let snapshot = entry.clone();
            spawn_notification("entry_paid", async move {
                notifier.entry_paid(&snapshot).await
            });
        }

        Ok(entry)
    }
}

/// Command to record a manual payment against an order.
#[derive(Debug, Clone)]
pub struct MarkOrderPaidCommand {
    pub id: OrderId,
}

/// Handler recording manual order payments.
pub struct MarkOrderPaidHandler {
    orders: Arc<dyn OrderRepository>,
    notifier: Arc<dyn Notifier>,
}

impl MarkOrderPaidHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { orders, notifier }
    }

    pub async fn handle(&self, cmd: MarkOrderPaidCommand) -> Result<Order, DomainError> {
        let (outcome, order) = self
            .orders
            .mark_paid(&cmd.id, MANUAL_PAYMENT_REFERENCE)
            .await?;

        if matches!(outcome, MarkPaid::Applied) {
            tracing::info!(order_number = %order.order_number, "order marked paid manually");
            let notifier = Arc::clone(&self.notifier);
            let snapshot = order.clone();
            spawn_notification("order_paid", async move {
                notifier.order_paid(&snapshot).await
            });
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use rust_decimal::Decimal;

    use crate::adapters::memory::{InMemoryEntryRepository, InMemoryOrderRepository};
    use crate::application::handlers::test_support::{settle_notifications, CountingNotifier};
    use crate::domain::entry::{CompetitionEvent, PaymentStatus};
    use crate::domain::foundation::Timestamp;
    use crate::domain::order::{generate_order_number, DeliveryMethod, OrderStatus};

    async fn seeded_entry(entries: &InMemoryEntryRepository) -> Entry {
        let entry = Entry::create(
            crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath"),
            Decimal::new(15000, 2),
            Timestamp::now(),
        )
        .unwrap();
        entries.insert(&entry).await.unwrap();
        entry
    }

    #[tokio::test]
    async fn manual_entry_payment_records_the_manual_reference() {
        let entries = Arc::new(InMemoryEntryRepository::new());
        let notifier = Arc::new(CountingNotifier::default());
        let entry = seeded_entry(&entries).await;
        let handler = MarkEntryPaidHandler::new(entries.clone(), notifier.clone());

        let updated = handler.handle(MarkEntryPaidCommand { id: entry.id }).await.unwrap();
        settle_notifications().await;

        assert_eq!(updated.payment_status, PaymentStatus::Paid);
        assert_eq!(updated.payment_intent_id.as_deref(), Some(MANUAL_PAYMENT_REFERENCE));
        assert_eq!(notifier.entry_paid.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_manual_payment_does_not_renotify() {
        let entries = Arc::new(InMemoryEntryRepository::new());
        let notifier = Arc::new(CountingNotifier::default());
        let entry = seeded_entry(&entries).await;
        let handler = MarkEntryPaidHandler::new(entries.clone(), notifier.clone());

        handler.handle(MarkEntryPaidCommand { id: entry.id }).await.unwrap();
        handler.handle(MarkEntryPaidCommand { id: entry.id }).await.unwrap();
        settle_notifications().await;

        assert_eq!(notifier.entry_paid.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn manual_payment_for_unknown_entry_fails() {
        let entries = Arc::new(InMemoryEntryRepository::new());
        let notifier = Arc::new(CountingNotifier::default());
        let handler = MarkEntryPaidHandler::new(entries, notifier);

        let result = handler
            .handle(MarkEntryPaidCommand { id: EntryId::new() })
            .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn manual_order_payment_transitions_to_paid() {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let notifier = Arc::new(CountingNotifier::default());
        let order = Order::create(
            crate::domain::order::test_draft(
                DeliveryMethod::Collection,
                vec![crate::domain::order::test_item("cap", 1, Decimal::new(1000, 2))],
            ),
            Decimal::ZERO,
            generate_order_number(Timestamp::now()),
            Timestamp::now(),
        )
        .unwrap();
        orders.insert(&order).await.unwrap();
        let handler = MarkOrderPaidHandler::new(orders.clone(), notifier.clone());

        let updated = handler.handle(MarkOrderPaidCommand { id: order.id }).await.unwrap();
        settle_notifications().await;

        assert_eq!(updated.status, OrderStatus::Paid);
        assert_eq!(updated.payment_intent_id.as_deref(), Some(MANUAL_PAYMENT_REFERENCE));
        assert_eq!(notifier.order_paid.load(Ordering::SeqCst), 1);
    }
}
