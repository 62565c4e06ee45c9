//! Administrative status update handlers.

use std::sync::Arc;

use crate::domain::entry::{Entry, PaymentStatus};
use crate::domain::foundation::{DomainError, EntryId, OrderId};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::{EntryRepository, OrderRepository};

/// Command to move an order through its fulfilment lifecycle or into the
/// cancelled/refunded escape hatch.
#[derive(Debug, Clone)]
pub struct UpdateOrderStatusCommand {
    pub id: OrderId,
    pub new_status: OrderStatus,
}

/// Handler for administrative order status changes.
///
/// The store applies the transition atomically; entering DELIVERED or
/// COLLECTED records the fulfilment time.
pub struct UpdateOrderStatusHandler {
    orders: Arc<dyn OrderRepository>,
}

impl UpdateOrderStatusHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, cmd: UpdateOrderStatusCommand) -> Result<Order, DomainError> {
        let order = self.orders.update_status(&cmd.id, cmd.new_status).await?;
        tracing::info!(
            order_number = %order.order_number,
            status = order.status.as_str(),
            "order status updated"
        );
        Ok(order)
    }
}

/// Command to cancel, fail or refund an entry administratively.
#[derive(Debug, Clone)]
pub struct UpdateEntryStatusCommand {
    pub id: EntryId,
    pub new_status: PaymentStatus,
}

/// Handler for administrative entry status changes.
pub struct UpdateEntryStatusHandler {
    entries: Arc<dyn EntryRepository>,
}

impl UpdateEntryStatusHandler {
    pub fn new(entries: Arc<dyn EntryRepository>) -> Self {
        Self { entries }
    }

    pub async fn handle(&self, cmd: UpdateEntryStatusCommand) -> Result<Entry, DomainError> {
        let entry = self.entries.update_status(&cmd.id, cmd.new_status).await?;
        tracing::info!(
            entry_id = %entry.id,
            status = entry.payment_status.as_str(),
            "entry status updated"
        );
        Ok(entry)
    }
}
