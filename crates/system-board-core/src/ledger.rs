//! Processed-event ledger abstraction, the idempotency primitive for
//! consumers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEvent {
    /// Primary key; at most one row per event.
    pub event_id: Uuid,
    /// Event type at the time it was marked.
    pub event_type: String,
    /// When the handler finished.
    pub processed_at: DateTime<Utc>,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}

/// Durable set of event ids that have already been handled.
///
/// Implementations must be backed by storage shared between consumer
/// processes, never a process-local cache.
#[async_trait]
pub trait ProcessedEventLedger: Send + Sync {
    /// Returns whether `event_id` has been marked as processed by any process.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` when the ledger store is unavailable.
    async fn is_processed(&self, event_id: Uuid) -> Result<bool, DomainError>;

    /// Inserts a ledger row if none exists for `event_id`. A duplicate insert
    /// is success, not an error.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` when the ledger store is unavailable.
    async fn mark_as_processed(
        &self,
        event_id: Uuid,
        event_type: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}
