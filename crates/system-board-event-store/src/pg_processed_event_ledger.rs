//! `PostgreSQL` implementation of the `ProcessedEventLedger` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use system_board_core::error::DomainError;
use system_board_core::ledger::{ProcessedEvent, ProcessedEventLedger};

use crate::unique_violation::{is_unique_violation, transport};

/// PostgreSQL-backed processed-event ledger.
///
/// Deduplication relies solely on the `processed_events` primary key: a second
/// insert for the same event id fails with a uniqueness violation, which is
/// reported as success.
#[derive(Debug, Clone)]
pub struct PgProcessedEventLedger {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProcessedEventRow {
    event_id: Uuid,
    event_type: String,
    processed_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl PgProcessedEventLedger {
    /// Creates a new `PgProcessedEventLedger`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the ledger row for `event_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` if the query fails.
    pub async fn entry(&self, event_id: Uuid) -> Result<Option<ProcessedEvent>, DomainError> {
        let row: Option<ProcessedEventRow> = sqlx::query_as(
            "SELECT event_id, event_type, processed_at, created_at FROM processed_events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(transport)?;

        Ok(row.map(|row| ProcessedEvent {
            event_id: row.event_id,
            event_type: row.event_type,
            processed_at: row.processed_at,
            created_at: row.created_at,
        }))
    }
}

#[async_trait]
impl ProcessedEventLedger for PgProcessedEventLedger {
    async fn is_processed(&self, event_id: Uuid) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM processed_events WHERE event_id = $1)",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(transport)
    }

    #[tracing::instrument(skip(self, processed_at), fields(event_id = %event_id))]
    async fn mark_as_processed(
        &self,
        event_id: Uuid,
        event_type: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let inserted = sqlx::query(
            "INSERT INTO processed_events (event_id, event_type, processed_at) VALUES ($1, $2, $3)",
        )
        .bind(event_id)
        .bind(event_type)
        .bind(processed_at)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                debug!("marked event as processed");
                Ok(())
            }
            Err(err) if is_unique_violation(&err, None) => {
                debug!("event already in ledger, skipping insert");
                Ok(())
            }
            Err(err) => Err(transport(err)),
        }
    }
}
