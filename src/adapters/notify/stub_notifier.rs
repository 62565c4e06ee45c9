//! Stub notifier.
//!
//! Logs every notification instead of sending it. Used until a mail
//! provider adapter is wired in; message content generation belongs to
//! that adapter, not this crate's core.

use async_trait::async_trait;

use crate::domain::entry::Entry;
use crate::domain::order::Order;
use crate::ports::{Notifier, NotifyError};

/// Notifier that records deliveries in the log only.
pub struct StubNotifier;

#[async_trait]
impl Notifier for StubNotifier {
    async fn entry_received(&self, entry: &Entry) -> Result<(), NotifyError> {
        tracing::info!(
            entry_id = %entry.id,
            event = %entry.event,
            club = %entry.club_name,
            recipient = %entry.player1.email,
            "entry confirmation (stub)"
        );
        Ok(())
    }

    async fn entry_paid(&self, entry: &Entry) -> Result<(), NotifyError> {
        tracing::info!(
            entry_id = %entry.id,
            event = %entry.event,
            recipient = %entry.player1.email,
            "entry payment confirmation (stub)"
        );
        Ok(())
    }

    async fn order_received(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_number = %order.order_number,
            recipient = %order.customer_email,
            total = %order.total,
            "order confirmation (stub)"
        );
        Ok(())
    }

    async fn order_paid(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_number = %order.order_number,
            recipient = %order.customer_email,
            "order payment confirmation (stub)"
        );
        Ok(())
    }
}
