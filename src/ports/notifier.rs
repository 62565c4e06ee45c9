//! Outbound notification port.
//!
//! Notifications are fire-and-forget: callers spawn them off the request
//! path and a failure must never roll back an already-committed state
//! transition. Message content generation lives behind this port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entry::Entry;
use crate::domain::order::Order;

/// Failure to deliver a notification. Logged, never propagated into the
/// triggering transition.
#[derive(Debug, Clone, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Port for confirmation and admin notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A new entry was received (payment may still be pending).
    async fn entry_received(&self, entry: &Entry) -> Result<(), NotifyError>;

    /// An entry's payment was confirmed.
    async fn entry_paid(&self, entry: &Entry) -> Result<(), NotifyError>;

    /// A new order was received (payment may still be pending).
    async fn order_received(&self, order: &Order) -> Result<(), NotifyError>;

    /// An order's payment was confirmed.
    async fn order_paid(&self, order: &Order) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn Notifier) {}
    }
}
