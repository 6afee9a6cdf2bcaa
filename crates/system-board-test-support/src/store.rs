//! Test event stores: in-memory `EventStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use system_board_core::error::DomainError;
use system_board_core::event::EventEnvelope;
use system_board_core::event_store::{
    EventStore, ExpectedVersion, StreamName, ensure_batch_continues_stream,
};

/// An event store holding streams in memory. The length check and the
/// append happen under one lock, so racing appends behave like the real
/// store: exactly one wins.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: Mutex<HashMap<StreamName, Vec<EventEnvelope>>>,
    appends: Mutex<Vec<(StreamName, ExpectedVersion, usize)>>,
}

impl InMemoryEventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of one stream.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stream(&self, stream_name: &StreamName) -> Vec<EventEnvelope> {
        self.streams
            .lock()
            .unwrap()
            .get(stream_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every accepted append as `(stream, expected version, batch size)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn accepted_appends(&self) -> Vec<(StreamName, ExpectedVersion, usize)> {
        self.appends.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
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

        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(stream_name.clone()).or_default();
        #[allow(clippy::cast_possible_wrap)]
        let actual = stream.len() as i64;
        if actual != expected_version.as_length() {
            return Err(DomainError::ConcurrencyConflict {
                stream_name: stream_name.to_string(),
                expected: expected_version.as_length(),
                actual,
            });
        }
        stream.extend_from_slice(events);
        self.appends
            .lock()
            .unwrap()
            .push((stream_name.clone(), expected_version, events.len()));
        Ok(())
    }

    async fn read(&self, stream_name: &StreamName) -> Result<Vec<EventEnvelope>, DomainError> {
        Ok(self.stream(stream_name))
    }
}

/// An event store that always returns a transport error.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append(
        &self,
        _stream_name: &StreamName,
        _events: &[EventEnvelope],
        _expected_version: ExpectedVersion,
    ) -> Result<(), DomainError> {
        Err(DomainError::Transport("connection refused".into()))
    }

    async fn read(&self, _stream_name: &StreamName) -> Result<Vec<EventEnvelope>, DomainError> {
        Err(DomainError::Transport("connection refused".into()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use system_board_core::event::EventMetadata;
    use uuid::Uuid;

    use super::*;

    fn event(aggregate_id: Uuid, version: i64) -> EventEnvelope {
        EventEnvelope::new(
            EventMetadata::new(
                "SystemRegistered",
                "System",
                aggregate_id,
                version,
                Uuid::new_v4(),
                Utc::now(),
            ),
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn test_racing_appends_with_same_expected_version_admit_exactly_one() {
        // Arrange
        let store = InMemoryEventStore::new();
        let id = Uuid::new_v4();
        let stream = StreamName::for_aggregate("System", id);
        let first = [event(id, 1)];
        let second = [event(id, 1)];

        // Act
        let (a, b) = tokio::join!(
            store.append(&stream, &first, ExpectedVersion::NoStream),
            store.append(&stream, &second, ExpectedVersion::NoStream),
        );

        // Assert
        assert!(a.is_ok() ^ b.is_ok());
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(
            loser,
            Err(DomainError::ConcurrencyConflict {
                expected: 0,
                actual: 1,
                ..
            })
        ));
        assert_eq!(store.stream(&stream).len(), 1);
    }

    #[tokio::test]
    async fn test_read_of_missing_stream_is_empty() {
        let store = InMemoryEventStore::new();

        let events = store
            .read(&StreamName::for_aggregate("System", Uuid::new_v4()))
            .await
            .unwrap();

        assert!(events.is_empty());
    }
}
