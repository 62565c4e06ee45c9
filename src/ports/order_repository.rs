//! Order store contract.
//!
//! Same atomicity rules as the entry store: `mark_paid` and `update_status`
//! run the aggregate transition inside a single serializable
//! read-modify-write against the order row (items included).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, MarkPaid, OrderId};
use crate::domain::order::{Order, OrderStatus};

/// Repository port for shop orders and their items.
///
/// An order exclusively owns its item rows; implementations persist and
/// delete them together with the order.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order with its items.
    ///
    /// An order-number collision surfaces as
    /// `DomainError::OrderNumberCollision`; it is never silently resolved
    /// by overwriting.
    async fn insert(&self, order: &Order) -> Result<(), DomainError>;

    /// Finds an order by its internal id.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Finds an order by its public order number.
    async fn find_by_order_number(&self, order_number: &str)
        -> Result<Option<Order>, DomainError>;

    /// Finds an order by its checkout session id.
    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Order>, DomainError>;

    /// Records the checkout session id (last write wins).
    async fn set_checkout_session(
        &self,
        id: &OrderId,
        session_id: &str,
    ) -> Result<(), DomainError>;

    /// Applies the idempotent paid transition atomically and returns the
    /// outcome together with the resulting order.
    async fn mark_paid(
        &self,
        id: &OrderId,
        payment_intent_id: &str,
    ) -> Result<(MarkPaid, Order), DomainError>;

    /// Applies an administrative status change atomically, recording the
    /// fulfilment time when entering DELIVERED or COLLECTED.
    async fn update_status(
        &self,
        id: &OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn OrderRepository) {}
    }
}
