//! CreateOrderHandler - submits a shop order and opens checkout.

use std::sync::Arc;

use crate::domain::checkout::order_checkout_request;
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::order::{generate_order_number, Order, OrderDraft};
use crate::domain::pricing::Pricing;
use crate::ports::{CheckoutGateway, Notifier, OrderRepository};

use super::spawn_notification;

/// Command to create a shop order.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub draft: OrderDraft,
}

/// Result of order creation.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order: Order,
    pub checkout_url: String,
}

/// Handler for order submission.
///
/// Derives the totals (subtotal from the lines, shipping from the pricing
/// tiers, zero for collection), assigns a fresh order number and opens a
/// checkout session. An order-number collision at the store fails the
/// request loudly rather than regenerating silently.
pub struct CreateOrderHandler {
    orders: Arc<dyn OrderRepository>,
    gateway: Arc<dyn CheckoutGateway>,
    notifier: Arc<dyn Notifier>,
    pricing: Pricing,
    frontend_url: String,
}

impl CreateOrderHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        gateway: Arc<dyn CheckoutGateway>,
        notifier: Arc<dyn Notifier>,
        pricing: Pricing,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            gateway,
            notifier,
            pricing,
            frontend_url: frontend_url.into(),
        }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, DomainError> {
        let draft = cmd.draft;
        draft.validate()?;

        let now = Timestamp::now();
        let shipping_cost = self
            .pricing
            .shipping_cost(draft.delivery_method, draft.subtotal());
        let order_number = generate_order_number(now);
        let mut order = Order::create(draft, shipping_cost, order_number, now)?;
        self.orders.insert(&order).await?;

        tracing::info!(
            order_number = %order.order_number,
            customer = %order.customer_email,
            total = %order.total,
            "created order"
        );

        let request = order_checkout_request(&order, &self.frontend_url)?;
        let session = self.gateway.create_session(request).await?;
        self.orders
            .set_checkout_session(&order.id, &session.id)
            .await?;
        order.set_checkout_session(&session.id);

        tracing::info!(
            order_number = %order.order_number,
            session_id = %session.id,
            "created checkout session"
        );

        let notifier = Arc::clone(&self.notifier);
        let snapshot = order.clone();
        spawn_notification("order_received", async move {
            notifier.order_received(&snapshot).await
        });

        Ok(CreateOrderResult {
            order,
            checkout_url: session.url,
        })
    }
}
