//! Command handlers wiring domain logic to ports.

mod create_entry;
mod create_order;
mod mark_paid;
mod process_webhook;
mod update_status;

pub use create_entry::{CreateEntryCommand, CreateEntryHandler, CreateEntryResult};
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use mark_paid::{
    MarkEntryPaidCommand, MarkEntryPaidHandler, MarkOrderPaidCommand, MarkOrderPaidHandler,
    MANUAL_PAYMENT_REFERENCE,
};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, WebhookOutcome};
pub use update_status::{
    UpdateEntryStatusCommand, UpdateEntryStatusHandler, UpdateOrderStatusCommand,
    UpdateOrderStatusHandler,
};

use crate::ports::NotifyError;

/// Spawns a fire-and-forget notification.
///
/// Delivery failure is logged and never propagated: the state transition
/// that triggered the notification has already committed.
pub(crate) fn spawn_notification<F>(label: &'static str, fut: F)
where
    F: std::future::Future<Output = Result<(), NotifyError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = fut.await {
            tracing::warn!(notification = label, error = %err, "notification delivery failed");
        }
    });
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared mock ports for handler tests.

    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::checkout::CheckoutSessionRequest;
    use crate::domain::entry::Entry;
    use crate::domain::order::Order;
    use crate::ports::{
        CheckoutGateway, CheckoutSession, Notifier, NotifyError, PaymentGatewayError,
    };

    /// Gateway returning deterministic sessions, recording every request.
    pub struct MockCheckoutGateway {
        pub requests: Mutex<Vec<CheckoutSessionRequest>>,
        counter: AtomicU32,
        fail: AtomicBool,
    }

    impl MockCheckoutGateway {
        pub fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                counter: AtomicU32::new(0),
                fail: AtomicBool::new(false),
            }
        }

        pub fn failing() -> Self {
            let gateway = Self::new();
            gateway.fail.store(true, Ordering::SeqCst);
            gateway
        }
    }

    #[async_trait]
    impl CheckoutGateway for MockCheckoutGateway {
        async fn create_session(
            &self,
            request: CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PaymentGatewayError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PaymentGatewayError::network("simulated gateway outage"));
            }
            self.requests.lock().unwrap().push(request);
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(CheckoutSession {
                id: format!("cs_test_{}", n),
                url: format!("https://checkout.stripe.com/c/pay/cs_test_{}", n),
            })
        }
    }

    /// Notifier counting deliveries per kind.
    #[derive(Default)]
    pub struct CountingNotifier {
        pub entry_received: AtomicU32,
        pub entry_paid: AtomicU32,
        pub order_received: AtomicU32,
        pub order_paid: AtomicU32,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn entry_received(&self, _entry: &Entry) -> Result<(), NotifyError> {
            self.entry_received.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn entry_paid(&self, _entry: &Entry) -> Result<(), NotifyError> {
            self.entry_paid.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn order_received(&self, _order: &Order) -> Result<(), NotifyError> {
            self.order_received.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn order_paid(&self, _order: &Order) -> Result<(), NotifyError> {
            self.order_paid.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Yields so spawned notification tasks get to run.
    pub async fn settle_notifications() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }
}
