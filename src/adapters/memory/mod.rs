//! In-memory store implementations.
//!
//! Used by tests and local development. Each repository holds its map
//! behind a mutex and performs every read-modify-write inside one critical
//! section, giving the same atomicity the Postgres adapters get from
//! row-locking transactions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::entry::{CompetitionEvent, Entry, PaymentStatus};
use crate::domain::foundation::{DomainError, EntryId, MarkPaid, OrderId, Timestamp};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::{EntryRepository, OrderRepository};

/// In-memory entry store.
pub struct InMemoryEntryRepository {
    entries: Mutex<HashMap<EntryId, Entry>>,
}

impl InMemoryEntryRepository {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryEntryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryRepository for InMemoryEntryRepository {
    async fn insert(&self, entry: &Entry) -> Result<(), DomainError> {
        let mut entries = self.entries.lock().map_err(|_| DomainError::database("entry store lock poisoned"))?;
        // Uniqueness check and insert share the lock, mirroring the
        // database unique index under concurrent submission.
        let duplicate = entries
            .values()
            .any(|e| e.event == entry.event && e.club_name == entry.club_name);
        if duplicate {
            return Err(DomainError::DuplicateEntry {
                event: entry.event.as_str().to_string(),
                club_name: entry.club_name.clone(),
            });
        }
        entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EntryId) -> Result<Option<Entry>, DomainError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| DomainError::database("entry store lock poisoned"))?
            .get(id)
            .cloned())
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Entry>, DomainError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| DomainError::database("entry store lock poisoned"))?
            .values()
            .find(|e| e.checkout_session_id.as_deref() == Some(session_id))
            .cloned())
    }

    async fn list_by_event(&self, event: CompetitionEvent) -> Result<Vec<Entry>, DomainError> {
        let mut result: Vec<Entry> = self
            .entries
            .lock()
            .map_err(|_| DomainError::database("entry store lock poisoned"))?
            .values()
            .filter(|e| e.event == event)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.created_at);
        Ok(result)
    }

    async fn list_paid_by_event(
        &self,
        event: CompetitionEvent,
    ) -> Result<Vec<Entry>, DomainError> {
        let mut result: Vec<Entry> = self
            .entries
            .lock()
            .map_err(|_| DomainError::database("entry store lock poisoned"))?
            .values()
            .filter(|e| e.event == event && e.payment_status == PaymentStatus::Paid)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.created_at);
        Ok(result)
    }

    async fn count_paid_by_event(&self, event: CompetitionEvent) -> Result<u64, DomainError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| DomainError::database("entry store lock poisoned"))?
            .values()
            .filter(|e| e.event == event && e.payment_status == PaymentStatus::Paid)
            .count() as u64)
    }

    async fn exists_for_club(
        &self,
        event: CompetitionEvent,
        club_name: &str,
    ) -> Result<bool, DomainError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| DomainError::database("entry store lock poisoned"))?
            .values()
            .any(|e| e.event == event && e.club_name == club_name))
    }

    async fn set_checkout_session(
        &self,
        id: &EntryId,
        session_id: &str,
    ) -> Result<(), DomainError> {
        let mut entries = self.entries.lock().map_err(|_| DomainError::database("entry store lock poisoned"))?;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("entry", id.to_string()))?;
        entry.set_checkout_session(session_id);
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: &EntryId,
        payment_intent_id: &str,
    ) -> Result<(MarkPaid, Entry), DomainError> {
        let mut entries = self.entries.lock().map_err(|_| DomainError::database("entry store lock poisoned"))?;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("entry", id.to_string()))?;
        let outcome = entry.mark_paid(payment_intent_id, Timestamp::now())?;
        Ok((outcome, entry.clone()))
    }

    async fn update_status(
        &self,
        id: &EntryId,
        new_status: PaymentStatus,
    ) -> Result<Entry, DomainError> {
        let mut entries = self.entries.lock().map_err(|_| DomainError::database("entry store lock poisoned"))?;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("entry", id.to_string()))?;
        entry.update_status(new_status)?;
        Ok(entry.clone())
    }
}

/// In-memory order store.
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.lock().map_err(|_| DomainError::database("order store lock poisoned"))?;
        if orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(DomainError::OrderNumberCollision(order.order_number.clone()));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .map_err(|_| DomainError::database("order store lock poisoned"))?
            .get(id)
            .cloned())
    }

    async fn find_by_order_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .map_err(|_| DomainError::database("order store lock poisoned"))?
            .values()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .map_err(|_| DomainError::database("order store lock poisoned"))?
            .values()
            .find(|o| o.checkout_session_id.as_deref() == Some(session_id))
            .cloned())
    }

    async fn set_checkout_session(
        &self,
        id: &OrderId,
        session_id: &str,
    ) -> Result<(), DomainError> {
        let mut orders = self.orders.lock().map_err(|_| DomainError::database("order store lock poisoned"))?;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("order", id.to_string()))?;
        order.set_checkout_session(session_id);
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: &OrderId,
        payment_intent_id: &str,
    ) -> Result<(MarkPaid, Order), DomainError> {
        let mut orders = self.orders.lock().map_err(|_| DomainError::database("order store lock poisoned"))?;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("order", id.to_string()))?;
        let outcome = order.mark_paid(payment_intent_id, Timestamp::now())?;
        Ok((outcome, order.clone()))
    }

    async fn update_status(
        &self,
        id: &OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut orders = self.orders.lock().map_err(|_| DomainError::database("order store lock poisoned"))?;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("order", id.to_string()))?;
        order.update_status(new_status, Timestamp::now())?;
        Ok(order.clone())
    }
}
