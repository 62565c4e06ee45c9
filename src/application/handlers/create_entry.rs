//! CreateEntryHandler - submits a competition entry and opens checkout.

use std::sync::Arc;

use crate::domain::checkout::entry_checkout_request;
use crate::domain::entry::{Entry, EntryDraft};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::pricing::Pricing;
use crate::ports::{CheckoutGateway, EntryRepository, Notifier};

use super::spawn_notification;

/// Command to create a competition entry.
#[derive(Debug, Clone)]
pub struct CreateEntryCommand {
    pub draft: EntryDraft,
}

/// Result of entry creation: the persisted entity plus the hosted checkout
/// redirect URL.
#[derive(Debug, Clone)]
pub struct CreateEntryResult {
    pub entry: Entry,
    pub checkout_url: String,
}

/// Handler for entry submission.
///
/// Creates the PENDING entry, opens a checkout session for its fixed fee
/// and stores the session id as the correlation key. The session call runs
/// outside any store lock; if it fails the entry stays PENDING without a
/// session and the user re-initiates checkout.
pub struct CreateEntryHandler {
    entries: Arc<dyn EntryRepository>,
    gateway: Arc<dyn CheckoutGateway>,
    notifier: Arc<dyn Notifier>,
    pricing: Pricing,
    frontend_url: String,
}

impl CreateEntryHandler {
    pub fn new(
        entries: Arc<dyn EntryRepository>,
        gateway: Arc<dyn CheckoutGateway>,
        notifier: Arc<dyn Notifier>,
        pricing: Pricing,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            entries,
            gateway,
            notifier,
            pricing,
            frontend_url: frontend_url.into(),
        }
    }

    pub async fn handle(&self, cmd: CreateEntryCommand) -> Result<CreateEntryResult, DomainError> {
        let draft = cmd.draft;
        draft.validate()?;

        // Fast, non-authoritative rejection; the store's unique constraint
        // is the guard that holds under races.
        if self
            .entries
            .exists_for_club(draft.event, &draft.club_name)
            .await?
        {
            return Err(DomainError::DuplicateEntry {
                event: draft.event.as_str().to_string(),
                club_name: draft.club_name,
            });
        }

        let entry_fee = self.pricing.entry_fee(draft.event);
        let mut entry = Entry::create(draft, entry_fee, Timestamp::now())?;
        self.entries.insert(&entry).await?;

        tracing::info!(
            entry_id = %entry.id,
            event = %entry.event,
            club = %entry.club_name,
            "created entry"
        );

        let request = entry_checkout_request(&entry, &self.frontend_url)?;
        let session = self.gateway.create_session(request).await?;
        self.entries
            .set_checkout_session(&entry.id, &session.id)
            .await?;
        entry.set_checkout_session(&session.id);

        tracing::info!(entry_id = %entry.id, session_id = %session.id, "created checkout session");

        let notifier = Arc::clone(&self.notifier);
        let snapshot = entry.clone();
        spawn_notification("entry_received", async move {
            notifier.entry_received(&snapshot).await
        });

        Ok(CreateEntryResult {
            entry,
            checkout_url: session.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::adapters::memory::InMemoryEntryRepository;
    use crate::application::handlers::test_support::{
        settle_notifications, CountingNotifier, MockCheckoutGateway,
    };
    use crate::domain::entry::{CompetitionEvent, PaymentStatus};

    const FRONTEND: &str = "https://nationalninesgolf.co.uk";

    struct Fixture {
        entries: Arc<InMemoryEntryRepository>,
        gateway: Arc<MockCheckoutGateway>,
        notifier: Arc<CountingNotifier>,
        handler: CreateEntryHandler,
    }

    fn fixture_with_gateway(gateway: MockCheckoutGateway) -> Fixture {
        let entries = Arc::new(InMemoryEntryRepository::new());
        let gateway = Arc::new(gateway);
        let notifier = Arc::new(CountingNotifier::default());
        let handler = CreateEntryHandler::new(
            entries.clone(),
            gateway.clone(),
            notifier.clone(),
            Pricing::default(),
            FRONTEND,
        );
        Fixture {
            entries,
            gateway,
            notifier,
            handler,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_gateway(MockCheckoutGateway::new())
    }

    #[tokio::test]
    async fn creates_pending_entry_with_event_fee_and_session() {
        let f = fixture();
        let result = f
            .handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath"),
            })
            .await
            .unwrap();

        assert_eq!(result.entry.payment_status, PaymentStatus::Pending);
        assert_eq!(result.entry.entry_fee, Decimal::new(15000, 2));
        assert_eq!(result.entry.checkout_session_id.as_deref(), Some("cs_test_1"));
        assert!(result.checkout_url.contains("cs_test_1"));

        let stored = f
            .entries
            .find_by_id(&result.entry.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.checkout_session_id.as_deref(), Some("cs_test_1"));
    }

    #[tokio::test]
    async fn essex_entry_receives_the_essex_fee() {
        let f = fixture();
        let result = f
            .handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Essex, "Chelmsford"),
            })
            .await
            .unwrap();

        assert_eq!(result.entry.entry_fee, Decimal::new(5000, 2));
    }

    #[tokio::test]
    async fn second_entry_for_same_club_and_event_is_rejected() {
        let f = fixture();
        f.handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath"),
            })
            .await
            .unwrap();

        let result = f
            .handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath"),
            })
            .await;

        assert!(matches!(result, Err(DomainError::DuplicateEntry { .. })));
    }

    #[tokio::test]
    async fn same_club_may_enter_the_other_event() {
        let f = fixture();
        f.handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath"),
            })
            .await
            .unwrap();

        let result = f
            .handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Essex, "Royal Blackheath"),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn gateway_failure_leaves_entry_pending_without_session() {
        let f = fixture_with_gateway(MockCheckoutGateway::failing());

        let result = f
            .handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath"),
            })
            .await;

        assert!(matches!(result, Err(DomainError::PaymentGateway(_))));

        // The entry survives so the user can re-initiate checkout.
        let stored = f
            .entries
            .list_by_event(CompetitionEvent::Kent)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].payment_status, PaymentStatus::Pending);
        assert!(stored[0].checkout_session_id.is_none());
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_persistence() {
        let f = fixture();
        let mut draft = crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath");
        draft.player1.handicap = Decimal::from(55);

        let result = f.handler.handle(CreateEntryCommand { draft }).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert!(f
            .entries
            .list_by_event(CompetitionEvent::Kent)
            .await
            .unwrap()
            .is_empty());
        assert!(f.gateway.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notifies_once_per_created_entry() {
        let f = fixture();
        f.handler
            .handle(CreateEntryCommand {
                draft: crate::domain::entry::test_draft(CompetitionEvent::Kent, "Royal Blackheath"),
            })
            .await
            .unwrap();
        settle_notifications().await;

        assert_eq!(
            f.notifier
                .entry_received
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }
}
