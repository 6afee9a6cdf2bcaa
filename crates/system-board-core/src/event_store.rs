//! Event store abstraction.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::EventEnvelope;

/// Name of a per-aggregate stream: `{aggregateType}-{aggregateId}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamName(String);

impl StreamName {
    /// Builds the stream name for an aggregate.
    #[must_use]
    pub fn for_aggregate(aggregate_type: &str, aggregate_id: Uuid) -> Self {
        Self(format!("{aggregate_type}-{aggregate_id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Precondition on the stream length for an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// The stream must not exist yet.
    NoStream,
    /// The stream must hold exactly this many events.
    Exact(i64),
}

impl ExpectedVersion {
    /// Maps a prior aggregate version onto a precondition (`0` means the
    /// stream must not exist yet).
    #[must_use]
    pub fn from_prior(version: i64) -> Self {
        if version <= 0 {
            Self::NoStream
        } else {
            Self::Exact(version)
        }
    }

    /// The stream length this precondition requires.
    #[must_use]
    pub fn as_length(self) -> i64 {
        match self {
            Self::NoStream => 0,
            Self::Exact(version) => version,
        }
    }
}

impl fmt::Display for ExpectedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStream => f.write_str("no stream"),
            Self::Exact(version) => write!(f, "{version}"),
        }
    }
}

/// Append-only per-stream event store with optimistic concurrency.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends `events` to `stream_name` iff the stream currently holds
    /// exactly `expected_version` events. An empty batch is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` on a length mismatch,
    /// `DomainError::Validation` for a batch that does not continue the
    /// stream, and `DomainError::Transport` when the store is unavailable.
    async fn append(
        &self,
        stream_name: &StreamName,
        events: &[EventEnvelope],
        expected_version: ExpectedVersion,
    ) -> Result<(), DomainError>;

    /// Reads the whole stream from the start. A missing stream reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Transport` when the store is unavailable.
    async fn read(&self, stream_name: &StreamName) -> Result<Vec<EventEnvelope>, DomainError>;
}

#[async_trait]
impl<S: EventStore + ?Sized> EventStore for Arc<S> {
    async fn append(
        &self,
        stream_name: &StreamName,
        events: &[EventEnvelope],
        expected_version: ExpectedVersion,
    ) -> Result<(), DomainError> {
        (**self).append(stream_name, events, expected_version).await
    }

    async fn read(&self, stream_name: &StreamName) -> Result<Vec<EventEnvelope>, DomainError> {
        (**self).read(stream_name).await
    }
}

/// Checks that a batch belongs to `stream_name` and continues it without gaps:
/// event `i` must carry aggregate version `expected + i + 1`.
///
/// # Errors
///
/// Returns `DomainError::Validation` describing the first offending event.
pub fn ensure_batch_continues_stream(
    stream_name: &StreamName,
    events: &[EventEnvelope],
    expected_version: ExpectedVersion,
) -> Result<(), DomainError> {
    let mut next = expected_version.as_length().checked_add(1);
    for event in events {
        if event.stream_name() != *stream_name {
            return Err(DomainError::Validation(format!(
                "event {} belongs to stream {}, not {stream_name}",
                event.event_id(),
                event.stream_name()
            )));
        }
        let Some(expected) = next.filter(|v| *v == event.aggregate_version()) else {
            return Err(DomainError::Validation(format!(
                "event {} has aggregate version {}, expected {}",
                event.event_id(),
                event.aggregate_version(),
                next.map_or_else(|| "none".to_owned(), |v| v.to_string())
            )));
        };
        next = expected.checked_add(1);
    }
    Ok(())
}
