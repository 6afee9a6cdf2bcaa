//! Test publishers: `EventPublisher` implementations for command handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use system_board_core::error::DomainError;
use system_board_core::event::EventEnvelope;
use system_board_core::publisher::EventPublisher;

/// A publisher that records every event it is asked to publish.
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    published: Mutex<Vec<EventEnvelope>>,
}

impl RecordingEventPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<EventEnvelope> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), DomainError> {
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn publish_all(&self, events: &[EventEnvelope]) -> Result<(), DomainError> {
        self.published.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

/// A publisher whose broker never acknowledges.
#[derive(Debug)]
pub struct FailingEventPublisher;

#[async_trait]
impl EventPublisher for FailingEventPublisher {
    async fn publish(&self, _event: &EventEnvelope) -> Result<(), DomainError> {
        Err(DomainError::Transport("broker unreachable".into()))
    }

    async fn publish_all(&self, _events: &[EventEnvelope]) -> Result<(), DomainError> {
        Err(DomainError::Transport("broker unreachable".into()))
    }
}
