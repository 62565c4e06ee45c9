//! Entry store contract.
//!
//! Implementations are the reconciliation subsystem's only synchronization
//! primitive: `mark_paid` and `update_status` must each execute as one
//! atomic, serializable read-modify-write against the entry row, applying
//! the aggregate's transition inside that critical section so concurrent
//! duplicate webhooks cannot double-apply side effects.

use async_trait::async_trait;

use crate::domain::entry::{CompetitionEvent, Entry, PaymentStatus};
use crate::domain::foundation::{DomainError, EntryId, MarkPaid};

/// Repository port for competition entries.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Persists a new entry.
    ///
    /// The store's unique constraint on (event, club_name) is the
    /// authoritative duplicate guard; violations surface as
    /// `DomainError::DuplicateEntry` even when the application-level check
    /// raced.
    async fn insert(&self, entry: &Entry) -> Result<(), DomainError>;

    /// Finds an entry by its internal id.
    async fn find_by_id(&self, id: &EntryId) -> Result<Option<Entry>, DomainError>;

    /// Finds an entry by its checkout session id (the correlation key with
    /// the external payment world).
    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Entry>, DomainError>;

    /// Lists all entries for an event.
    async fn list_by_event(&self, event: CompetitionEvent) -> Result<Vec<Entry>, DomainError>;

    /// Lists paid entries for an event.
    async fn list_paid_by_event(&self, event: CompetitionEvent)
        -> Result<Vec<Entry>, DomainError>;

    /// Counts paid entries for an event.
    async fn count_paid_by_event(&self, event: CompetitionEvent) -> Result<u64, DomainError>;

    /// Fast, non-authoritative duplicate check used to reject early.
    async fn exists_for_club(
        &self,
        event: CompetitionEvent,
        club_name: &str,
    ) -> Result<bool, DomainError>;

    /// Records the checkout session id for an entry, overwriting any
    /// previous session (last write wins).
    async fn set_checkout_session(
        &self,
        id: &EntryId,
        session_id: &str,
    ) -> Result<(), DomainError>;

    /// Applies the idempotent paid transition atomically and returns the
    /// outcome together with the resulting entry.
    async fn mark_paid(
        &self,
        id: &EntryId,
        payment_intent_id: &str,
    ) -> Result<(MarkPaid, Entry), DomainError>;

    /// Applies an administrative status change atomically.
    async fn update_status(
        &self,
        id: &EntryId,
        new_status: PaymentStatus,
    ) -> Result<Entry, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn EntryRepository) {}
    }
}
