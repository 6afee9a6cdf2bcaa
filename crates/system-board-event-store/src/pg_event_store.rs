//! `PostgreSQL` implementation of the `EventStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use system_board_core::error::DomainError;
use system_board_core::event::{EventEnvelope, EventMetadata};
use system_board_core::event_store::{
    EventStore, ExpectedVersion, StreamName, ensure_batch_continues_stream,
};

use crate::unique_violation::{is_unique_violation, transport};

const INSERT_EVENT: &str = r"
INSERT INTO domain_events (
    event_id, stream_name, aggregate_id, aggregate_type, aggregate_version,
    event_type, payload, correlation_id, causation_id, occurred_on
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
";

const SELECT_STREAM: &str = r"
SELECT event_id, aggregate_id, aggregate_type, aggregate_version, event_type,
       payload, correlation_id, causation_id, occurred_on
FROM domain_events
WHERE stream_name = $1
ORDER BY aggregate_version
";

const COUNT_STREAM: &str = "SELECT COUNT(*) FROM domain_events WHERE stream_name = $1";

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    aggregate_id: Uuid,
    aggregate_type: String,
    aggregate_version: i64,
    event_type: String,
    payload: serde_json::Value,
    correlation_id: Uuid,
    causation_id: Option<Uuid>,
    occurred_on: DateTime<Utc>,
}

impl From<EventRow> for EventEnvelope {
    fn from(row: EventRow) -> Self {
        EventEnvelope::new(
            EventMetadata {
                event_id: row.event_id,
                event_type: row.event_type,
                aggregate_id: row.aggregate_id,
                aggregate_type: row.aggregate_type,
                aggregate_version: row.aggregate_version,
                occurred_on: row.occurred_on,
                correlation_id: row.correlation_id,
                causation_id: row.causation_id,
            },
            row.payload,
        )
    }
}

/// PostgreSQL-backed event store.
///
/// The expected-version check runs inside the append transaction; the
/// `(stream_name, aggregate_version)` unique constraint settles races between
/// two transactions that both passed it.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn stream_length(
        conn: &mut PgConnection,
        stream_name: &StreamName,
    ) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>(COUNT_STREAM)
            .bind(stream_name.as_str())
            .fetch_one(conn)
            .await
            .map_err(transport)
    }

    async fn conflict(&self, stream_name: &StreamName, expected: ExpectedVersion) -> DomainError {
        let actual = match self.pool.acquire().await {
            Ok(mut conn) => Self::stream_length(&mut conn, stream_name).await,
            Err(err) => Err(transport(err)),
        };
        match actual {
            Ok(actual) => DomainError::ConcurrencyConflict {
                stream_name: stream_name.to_string(),
                expected: expected.as_length(),
                actual,
            },
            Err(err) => err,
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[tracing::instrument(skip(self, events), fields(stream_name = %stream_name, count = events.len()))]
    async fn append(
        &self,
        stream_name: &StreamName,
        events: &[EventEnvelope],
        expected_version: ExpectedVersion,
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }
        ensure_batch_continues_stream(stream_name, events, expected_version)?;

        let mut tx = self.pool.begin().await.map_err(transport)?;

        let actual = Self::stream_length(&mut tx, stream_name).await?;
        if actual != expected_version.as_length() {
            return Err(DomainError::ConcurrencyConflict {
                stream_name: stream_name.to_string(),
                expected: expected_version.as_length(),
                actual,
            });
        }

        for event in events {
            let inserted = sqlx::query(INSERT_EVENT)
                .bind(event.event_id())
                .bind(stream_name.as_str())
                .bind(event.aggregate_id())
                .bind(event.aggregate_type())
                .bind(event.aggregate_version())
                .bind(event.event_type())
                .bind(event.payload())
                .bind(event.correlation_id())
                .bind(event.causation_id())
                .bind(event.occurred_on())
                .execute(&mut *tx)
                .await;

            if let Err(err) = inserted {
                // A racing append of the same event trips the event_id key
                // instead of the stream position key; both are conflicts.
                if is_unique_violation(&err, None) {
                    drop(tx);
                    return Err(self.conflict(stream_name, expected_version).await);
                }
                return Err(transport(err));
            }
        }

        tx.commit().await.map_err(transport)?;

        debug!(expected_version = %expected_version, "appended events");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(stream_name = %stream_name))]
    async fn read(&self, stream_name: &StreamName) -> Result<Vec<EventEnvelope>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(SELECT_STREAM)
            .bind(stream_name.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(transport)?;

        debug!(count = rows.len(), "read stream");
        Ok(rows.into_iter().map(EventEnvelope::from).collect())
    }
}
