//! Event publisher abstraction.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::event::EventEnvelope;

/// Publishes events to the message bus.
///
/// A command counts as successful only once its events were published, so a
/// successful return means the broker acknowledged every event.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes a single event and waits for the broker acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` if the event was not acknowledged.
    async fn publish(&self, event: &EventEnvelope) -> Result<(), DomainError>;

    /// Publishes a batch. Each event still waits for its own acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PartialPublish` when some events were
    /// acknowledged and others were not, or the underlying error when none
    /// were.
    async fn publish_all(&self, events: &[EventEnvelope]) -> Result<(), DomainError>;
}
