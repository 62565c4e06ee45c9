//! PostgreSQL implementation of the entry store.
//!
//! `mark_paid` and `update_status` run as one transaction with the entry
//! row locked (`SELECT ... FOR UPDATE`), applying the aggregate transition
//! inside the critical section so concurrent duplicate webhooks serialize
//! against the row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entry::{CompetitionEvent, Entry, PaymentStatus, Player};
use crate::domain::foundation::{DomainError, EntryId, MarkPaid, Timestamp};
use crate::ports::EntryRepository;

/// PostgreSQL implementation of the EntryRepository port.
pub struct PostgresEntryRepository {
    pool: PgPool,
}

impl PostgresEntryRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an entry.
#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    event: String,
    club_name: String,
    player1_name: String,
    player1_email: String,
    player1_handicap: Decimal,
    player2_name: String,
    player2_email: String,
    player2_handicap: Decimal,
    contact_phone: String,
    marketing_opt_in: bool,
    payment_status: String,
    payment_intent_id: Option<String>,
    checkout_session_id: Option<String>,
    entry_fee: Decimal,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl TryFrom<EntryRow> for Entry {
    type Error = DomainError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let event: CompetitionEvent = row
            .event
            .parse()
            .map_err(|_| DomainError::database(format!("invalid event value: {}", row.event)))?;
        let payment_status = PaymentStatus::parse(&row.payment_status)?;

        Ok(Entry {
            id: EntryId::from_uuid(row.id),
            event,
            club_name: row.club_name,
            player1: Player {
                name: row.player1_name,
                email: row.player1_email,
                handicap: row.player1_handicap,
            },
            player2: Player {
                name: row.player2_name,
                email: row.player2_email,
                handicap: row.player2_handicap,
            },
            contact_phone: row.contact_phone,
            marketing_opt_in: row.marketing_opt_in,
            payment_status,
            payment_intent_id: row.payment_intent_id,
            checkout_session_id: row.checkout_session_id,
            entry_fee: row.entry_fee,
            created_at: Timestamp::from_datetime(row.created_at),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, event, club_name,
           player1_name, player1_email, player1_handicap,
           player2_name, player2_email, player2_handicap,
           contact_phone, marketing_opt_in,
           payment_status, payment_intent_id, checkout_session_id,
           entry_fee, created_at, paid_at
    FROM entries
"#;

#[async_trait]
impl EntryRepository for PostgresEntryRepository {
    async fn insert(&self, entry: &Entry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO entries (
                id, event, club_name,
                player1_name, player1_email, player1_handicap,
                player2_name, player2_email, player2_handicap,
                contact_phone, marketing_opt_in,
                payment_status, payment_intent_id, checkout_session_id,
                entry_fee, created_at, paid_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.event.as_str())
        .bind(&entry.club_name)
        .bind(&entry.player1.name)
        .bind(&entry.player1.email)
        .bind(entry.player1.handicap)
        .bind(&entry.player2.name)
        .bind(&entry.player2.email)
        .bind(entry.player2.handicap)
        .bind(&entry.contact_phone)
        .bind(entry.marketing_opt_in)
        .bind(entry.payment_status.as_str())
        .bind(&entry.payment_intent_id)
        .bind(&entry.checkout_session_id)
        .bind(entry.entry_fee)
        .bind(entry.created_at.as_datetime())
        .bind(entry.paid_at.as_ref().map(Timestamp::as_datetime))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("entries_event_club_name_key") {
                    return DomainError::DuplicateEntry {
                        event: entry.event.as_str().to_string(),
                        club_name: entry.club_name.clone(),
                    };
                }
            }
            DomainError::database(format!("failed to insert entry: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &EntryId) -> Result<Option<Entry>, DomainError> {
        let row: Option<EntryRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::database)?;

        row.map(Entry::try_from).transpose()
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Option<Entry>, DomainError> {
        let row: Option<EntryRow> =
            sqlx::query_as(&format!("{} WHERE checkout_session_id = $1", SELECT_COLUMNS))
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DomainError::database)?;

        row.map(Entry::try_from).transpose()
    }

    async fn list_by_event(&self, event: CompetitionEvent) -> Result<Vec<Entry>, DomainError> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "{} WHERE event = $1 ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(event.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::database)?;

        rows.into_iter().map(Entry::try_from).collect()
    }

    async fn list_paid_by_event(
        &self,
        event: CompetitionEvent,
    ) -> Result<Vec<Entry>, DomainError> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "{} WHERE event = $1 AND payment_status = $2 ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(event.as_str())
        .bind(PaymentStatus::Paid.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::database)?;

        rows.into_iter().map(Entry::try_from).collect()
    }

    async fn count_paid_by_event(&self, event: CompetitionEvent) -> Result<u64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM entries WHERE event = $1 AND payment_status = $2",
        )
        .bind(event.as_str())
        .bind(PaymentStatus::Paid.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::database)?;

        Ok(count as u64)
    }

    async fn exists_for_club(
        &self,
        event: CompetitionEvent,
        club_name: &str,
    ) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM entries WHERE event = $1 AND club_name = $2)",
        )
        .bind(event.as_str())
        .bind(club_name)
        .fetch_one(&self.pool)
        .await
        .map_err(DomainError::database)?;

        Ok(exists)
    }

    async fn set_checkout_session(
        &self,
        id: &EntryId,
        session_id: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE entries SET checkout_session_id = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::database)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("entry", id.to_string()));
        }
        Ok(())
    }

    async fn mark_paid(
        &self,
        id: &EntryId,
        payment_intent_id: &str,
    ) -> Result<(MarkPaid, Entry), DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::database)?;

        let row: Option<EntryRow> =
            sqlx::query_as(&format!("{} WHERE id = $1 FOR UPDATE", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(DomainError::database)?;

        let mut entry: Entry = row
            .ok_or_else(|| DomainError::not_found("entry", id.to_string()))?
            .try_into()?;

        // Transition applied under the row lock. An error drops the
        // transaction, rolling back.
        let outcome = entry.mark_paid(payment_intent_id, Timestamp::now())?;

        if outcome.was_applied() {
            sqlx::query(
                r#"
                UPDATE entries
                SET payment_status = $2, payment_intent_id = $3, paid_at = $4
                WHERE id = $1
                "#,
            )
            .bind(id.as_uuid())
            .bind(entry.payment_status.as_str())
            .bind(&entry.payment_intent_id)
            .bind(entry.paid_at.as_ref().map(Timestamp::as_datetime))
            .execute(&mut *tx)
            .await
            .map_err(DomainError::database)?;
        }

        tx.commit().await.map_err(DomainError::database)?;
        Ok((outcome, entry))
    }

    async fn update_status(
        &self,
        id: &EntryId,
        new_status: PaymentStatus,
    ) -> Result<Entry, DomainError> {
        let mut tx = self.pool.begin().await.map_err(DomainError::database)?;

        let row: Option<EntryRow> =
            sqlx::query_as(&format!("{} WHERE id = $1 FOR UPDATE", SELECT_COLUMNS))
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(DomainError::database)?;

        let mut entry: Entry = row
            .ok_or_else(|| DomainError::not_found("entry", id.to_string()))?
            .try_into()?;

        entry.update_status(new_status)?;

        sqlx::query("UPDATE entries SET payment_status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(entry.payment_status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(DomainError::database)?;

        tx.commit().await.map_err(DomainError::database)?;
        Ok(entry)
    }
}
