//! Axum router configuration.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    count_entries_by_event, create_entry, create_order, get_entry, get_order, get_order_status,
    list_entries_by_event, list_paid_entries_by_event, mark_entry_paid, mark_order_paid,
    stripe_webhook, update_entry_status, update_order_status, AppState,
};

/// Public entry endpoints.
fn entry_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_entry))
        .route("/:id", get(get_entry))
        .route("/event/:event", get(list_entries_by_event))
        .route("/event/:event/paid", get(list_paid_entries_by_event))
        .route("/event/:event/count", get(count_entries_by_event))
}

/// Public order endpoints.
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/:order_number", get(get_order))
        .route("/:order_number/status", get(get_order_status))
}

/// Webhook endpoints. No user authentication; requests are verified by
/// signature over the raw body.
fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(stripe_webhook))
}

/// Administrative endpoints (mark-paid for bank transfers, fulfilment).
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/entries/:id/mark-paid", post(mark_entry_paid))
        .route("/entries/:id/status", post(update_entry_status))
        .route("/orders/:id/mark-paid", post(mark_order_paid))
        .route("/orders/:id/status", post(update_order_status))
}

/// Complete API router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/entries", entry_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/webhooks", webhook_routes())
        .nest("/api/admin", admin_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use secrecy::SecretString;

    use crate::adapters::memory::{InMemoryEntryRepository, InMemoryOrderRepository};
    use crate::adapters::notify::StubNotifier;
    use crate::domain::pricing::Pricing;
    use crate::domain::webhook::WebhookSignatureVerifier;
    use crate::ports::{CheckoutGateway, CheckoutSession, PaymentGatewayError};

    struct NoopGateway;

    #[async_trait::async_trait]
    impl CheckoutGateway for NoopGateway {
        async fn create_session(
            &self,
            _request: crate::domain::checkout::CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PaymentGatewayError> {
            Ok(CheckoutSession {
                id: "cs_test".to_string(),
                url: "https://checkout.stripe.com/c/pay/cs_test".to_string(),
            })
        }
    }

    fn test_state() -> AppState {
        AppState {
            entries: Arc::new(InMemoryEntryRepository::new()),
            orders: Arc::new(InMemoryOrderRepository::new()),
            gateway: Arc::new(NoopGateway),
            notifier: Arc::new(StubNotifier),
            verifier: WebhookSignatureVerifier::new(SecretString::new(
                "whsec_test".to_string(),
            )),
            pricing: Pricing::default(),
            frontend_url: "https://nationalninesgolf.co.uk".to_string(),
        }
    }

    #[test]
    fn api_router_builds() {
        let _router = api_router(test_state());
    }
}
