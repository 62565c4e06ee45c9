//! Competition entry aggregate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CompetitionEvent, PaymentStatus};
use crate::domain::foundation::{DomainError, EntryId, MarkPaid, StateMachine, Timestamp};

/// Handicap index bounds accepted for either player.
const MIN_HANDICAP: Decimal = Decimal::ZERO;

fn max_handicap() -> Decimal {
    Decimal::from(54)
}

/// One half of a pair entering a competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub email: String,
    pub handicap: Decimal,
}

impl Player {
    fn validate(&self, field_prefix: &str) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation(
                format!("{}_name", field_prefix),
                "must not be empty",
            ));
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(DomainError::validation(
                format!("{}_email", field_prefix),
                "must be a valid email address",
            ));
        }
        if self.handicap < MIN_HANDICAP || self.handicap > max_handicap() {
            return Err(DomainError::validation(
                format!("{}_handicap", field_prefix),
                "must be between 0 and 54",
            ));
        }
        Ok(())
    }
}

/// Client-submitted entry data, validated before an Entry is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryDraft {
    pub event: CompetitionEvent,
    pub club_name: String,
    pub player1: Player,
    pub player2: Player,
    pub contact_phone: String,
    pub marketing_opt_in: bool,
}

impl EntryDraft {
    /// Validates the draft against the accepted ranges.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.club_name.trim().is_empty() {
            return Err(DomainError::validation("club_name", "must not be empty"));
        }
        self.player1.validate("player1")?;
        self.player2.validate("player2")?;
        if self.contact_phone.trim().is_empty() {
            return Err(DomainError::validation("contact_phone", "must not be empty"));
        }
        Ok(())
    }
}

/// A pair's entry into a competition, tracked from submission to payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub event: CompetitionEvent,
    pub club_name: String,
    pub player1: Player,
    pub player2: Player,
    pub contact_phone: String,
    pub marketing_opt_in: bool,
    pub payment_status: PaymentStatus,
    /// Payment-intent identifier recorded when the entry is marked paid.
    pub payment_intent_id: Option<String>,
    /// Hosted checkout session correlating this entry with the processor.
    pub checkout_session_id: Option<String>,
    /// Fixed fee derived from the event at creation, never recomputed.
    pub entry_fee: Decimal,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,
}

impl Entry {
    /// Creates a pending entry from a validated draft.
    ///
    /// The fee is computed by the caller from the event alone (see the
    /// pricing calculator) and stored on the entry for its lifetime.
    pub fn create(draft: EntryDraft, entry_fee: Decimal, now: Timestamp) -> Result<Self, DomainError> {
        draft.validate()?;
        Ok(Entry {
            id: EntryId::new(),
            event: draft.event,
            club_name: draft.club_name,
            player1: draft.player1,
            player2: draft.player2,
            contact_phone: draft.contact_phone,
            marketing_opt_in: draft.marketing_opt_in,
            payment_status: PaymentStatus::Pending,
            payment_intent_id: None,
            checkout_session_id: None,
            entry_fee,
            created_at: now,
            paid_at: None,
        })
    }

    /// Records a confirmed payment.
    ///
    /// Redelivered confirmations are normal operation: an already-paid entry
    /// returns `AlreadyPaid` without changing anything. Terminal states fail
    /// with an invalid-transition error and require manual reconciliation.
    pub fn mark_paid(
        &mut self,
        payment_intent_id: &str,
        now: Timestamp,
    ) -> Result<MarkPaid, DomainError> {
        if self.payment_status == PaymentStatus::Paid {
            return Ok(MarkPaid::AlreadyPaid);
        }
        self.payment_status = self.payment_status.transition_to(PaymentStatus::Paid)?;
        self.payment_intent_id = Some(payment_intent_id.to_string());
        self.paid_at = Some(now);
        Ok(MarkPaid::Applied)
    }

    /// Administrative status change (fail, cancel, refund), validated by the
    /// state machine.
    pub fn update_status(&mut self, new_status: PaymentStatus) -> Result<(), DomainError> {
        self.payment_status = self.payment_status.transition_to(new_status)?;
        Ok(())
    }

    /// Records the checkout session created for this entry.
    ///
    /// Last write wins: only one open session is expected per entry at a
    /// time, and re-initiated checkouts replace the previous session.
    pub fn set_checkout_session(&mut self, session_id: &str) {
        self.checkout_session_id = Some(session_id.to_string());
    }
}

#[cfg(test)]
pub(crate) fn test_draft(event: CompetitionEvent, club_name: &str) -> EntryDraft {
    EntryDraft {
        event,
        club_name: club_name.to_string(),
        player1: Player {
            name: "Alice Fairway".to_string(),
            email: "alice@example.com".to_string(),
            handicap: Decimal::new(121, 1),
        },
        player2: Player {
            name: "Bob Bunker".to_string(),
            email: "bob@example.com".to_string(),
            handicap: Decimal::new(280, 1),
        },
        contact_phone: "07700 900123".to_string(),
        marketing_opt_in: true,
    }
}
