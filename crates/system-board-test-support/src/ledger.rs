//! Test ledgers: in-memory `ProcessedEventLedger` implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use system_board_core::error::DomainError;
use system_board_core::ledger::{ProcessedEvent, ProcessedEventLedger};
use uuid::Uuid;

/// A ledger keyed by event id with insert-if-absent semantics.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    rows: Mutex<HashMap<Uuid, ProcessedEvent>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all rows.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn entries(&self) -> Vec<ProcessedEvent> {
        self.rows.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl ProcessedEventLedger for InMemoryLedger {
    async fn is_processed(&self, event_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.rows.lock().unwrap().contains_key(&event_id))
    }

    async fn mark_as_processed(
        &self,
        event_id: Uuid,
        event_type: &str,
        processed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.rows
            .lock()
            .unwrap()
            .entry(event_id)
            .or_insert_with(|| ProcessedEvent {
                event_id,
                event_type: event_type.to_owned(),
                processed_at,
                created_at: Utc::now(),
            });
        Ok(())
    }
}

/// A ledger whose store is always unreachable.
#[derive(Debug)]
pub struct FailingLedger;

#[async_trait]
impl ProcessedEventLedger for FailingLedger {
    async fn is_processed(&self, _event_id: Uuid) -> Result<bool, DomainError> {
        Err(DomainError::Transport("ledger unavailable".into()))
    }

    async fn mark_as_processed(
        &self,
        _event_id: Uuid,
        _event_type: &str,
        _processed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        Err(DomainError::Transport("ledger unavailable".into()))
    }
}
