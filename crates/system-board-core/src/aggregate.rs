//! Aggregate root abstraction.

use tracing::warn;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{DecodeEvent, DomainEvent, EventEnvelope};
use crate::event_store::StreamName;

/// Version counter and uncommitted-event buffer carried by every aggregate.
#[derive(Debug, Clone)]
pub struct EventHistory<E> {
    version: i64,
    uncommitted: Vec<E>,
}

impl<E> Default for EventHistory<E> {
    fn default() -> Self {
        Self {
            version: 0,
            uncommitted: Vec::new(),
        }
    }
}

impl<E> EventHistory<E> {
    /// Number of events folded so far.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Events produced since the last commit, in emission order.
    #[must_use]
    pub fn uncommitted(&self) -> &[E] {
        &self.uncommitted
    }

    pub(crate) fn advance(&mut self) {
        self.version += 1;
    }

    pub(crate) fn record(&mut self, event: E) {
        self.uncommitted.push(event);
    }

    pub(crate) fn clear(&mut self) {
        self.uncommitted.clear();
    }
}

/// Trait for aggregate roots whose state is a fold over their event history.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Aggregate kind, the prefix of its stream name.
    const AGGREGATE_TYPE: &'static str;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    fn history(&self) -> &EventHistory<Self::Event>;

    fn history_mut(&mut self) -> &mut EventHistory<Self::Event>;

    /// Folds one event into state. Must be pure and deterministic; version
    /// bookkeeping is done by [`AggregateRoot::apply_event`].
    fn apply(&mut self, event: &Self::Event);

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64 {
        self.history().version()
    }

    /// Returns the stream this aggregate is persisted to.
    fn stream_name(&self) -> StreamName {
        StreamName::for_aggregate(Self::AGGREGATE_TYPE, self.aggregate_id())
    }

    /// Folds `event`, bumps the version and, for new events, buffers it as
    /// uncommitted.
    fn apply_event(&mut self, event: Self::Event, is_new: bool) {
        self.apply(&event);
        let history = self.history_mut();
        history.advance();
        if is_new {
            history.record(event);
        }
    }

    /// Replays already-committed events. Never touches the uncommitted buffer.
    fn load_from_history<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = Self::Event>,
        Self: Sized,
    {
        for event in events {
            self.apply_event(event, false);
        }
    }

    /// Replays stored envelopes through the event type's decode registry.
    ///
    /// Unknown event types are logged and skipped; they still count towards
    /// the version so that it keeps matching the stream length.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CorruptStream` if aggregate versions are not
    /// `version + 1, version + 2, ...`, or `DomainError::Serialization` if a
    /// known event's payload does not decode.
    fn load_from_envelopes(&mut self, envelopes: &[EventEnvelope]) -> Result<(), DomainError>
    where
        Self::Event: DecodeEvent,
        Self: Sized,
    {
        for envelope in envelopes {
            let expected = self.version() + 1;
            if envelope.aggregate_version() != expected {
                return Err(DomainError::CorruptStream {
                    stream_name: self.stream_name().to_string(),
                    expected,
                    found: envelope.aggregate_version(),
                });
            }
            match Self::Event::from_envelope(envelope)? {
                Some(event) => self.apply_event(event, false),
                None => {
                    warn!(
                        event_id = %envelope.event_id(),
                        event_type = envelope.event_type(),
                        stream_name = %self.stream_name(),
                        "skipping unknown event type during replay"
                    );
                    self.history_mut().advance();
                }
            }
        }
        Ok(())
    }

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event] {
        self.history().uncommitted()
    }

    /// Clears uncommitted events. Call only after they were published or
    /// persisted successfully.
    fn mark_events_as_committed(&mut self) {
        self.history_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use uuid::Uuid;

    use super::{AggregateRoot, EventHistory};
    use crate::error::DomainError;
    use crate::event::{DecodeEvent, DomainEvent, EventEnvelope, EventMetadata};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Incremented {
        by: i64,
    }

    #[derive(Debug, Clone)]
    struct CounterEvent {
        metadata: EventMetadata,
        kind: Incremented,
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            "Incremented"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::to_value(&self.kind).unwrap()
        }

        fn metadata(&self) -> &EventMetadata {
            &self.metadata
        }
    }

    impl DecodeEvent for CounterEvent {
        fn from_envelope(envelope: &EventEnvelope) -> Result<Option<Self>, DomainError> {
            if envelope.event_type() != "Incremented" {
                return Ok(None);
            }
            let kind = serde_json::from_value(envelope.payload().clone())
                .map_err(|e| DomainError::Serialization(e.to_string()))?;
            Ok(Some(Self {
                metadata: envelope.metadata().clone(),
                kind,
            }))
        }
    }

    #[derive(Debug, Default)]
    struct Counter {
        id: Uuid,
        total: i64,
        history: EventHistory<CounterEvent>,
    }

    impl Counter {
        fn increment(&mut self, by: i64) {
            let metadata = EventMetadata::new(
                "Incremented",
                Self::AGGREGATE_TYPE,
                self.id,
                self.version() + 1,
                Uuid::nil(),
                Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            );
            self.apply_event(
                CounterEvent {
                    metadata,
                    kind: Incremented { by },
                },
                true,
            );
        }
    }

    impl AggregateRoot for Counter {
        type Event = CounterEvent;

        const AGGREGATE_TYPE: &'static str = "Counter";

        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn history(&self) -> &EventHistory<CounterEvent> {
            &self.history
        }

        fn history_mut(&mut self) -> &mut EventHistory<CounterEvent> {
            &mut self.history
        }

        fn apply(&mut self, event: &CounterEvent) {
            self.total += event.kind.by;
        }
    }

    fn envelope(id: Uuid, version: i64, event_type: &str, payload: serde_json::Value) -> EventEnvelope {
        EventEnvelope::new(
            EventMetadata::new(event_type, "Counter", id, version, Uuid::nil(), Utc::now()),
            payload,
        )
    }

    #[test]
    fn test_new_events_are_buffered_and_version_advances() {
        let mut counter = Counter::default();

        counter.increment(2);
        counter.increment(3);

        assert_eq!(counter.total, 5);
        assert_eq!(counter.version(), 2);
        assert_eq!(counter.uncommitted_events().len(), 2);
        assert_eq!(counter.uncommitted_events()[1].metadata.aggregate_version, 2);
    }

    #[test]
    fn test_mark_events_as_committed_clears_buffer_but_keeps_version() {
        let mut counter = Counter::default();
        counter.increment(1);

        counter.mark_events_as_committed();

        assert!(counter.uncommitted_events().is_empty());
        assert_eq!(counter.version(), 1);
    }

    #[test]
    fn test_replay_is_deterministic_and_leaves_buffer_empty() {
        // Arrange
        let mut source = Counter {
            id: Uuid::new_v4(),
            ..Counter::default()
        };
        source.increment(4);
        source.increment(-1);
        source.increment(10);
        let history: Vec<CounterEvent> = source.uncommitted_events().to_vec();

        // Act
        let mut first = Counter {
            id: source.id,
            ..Counter::default()
        };
        first.load_from_history(history.clone());
        let mut second = Counter {
            id: source.id,
            ..Counter::default()
        };
        second.load_from_history(history);

        // Assert
        assert_eq!(first.total, 13);
        assert_eq!(first.total, second.total);
        assert_eq!(first.version(), second.version());
        assert_eq!(first.version(), 3);
        assert!(first.uncommitted_events().is_empty());
    }

    #[test]
    fn test_unknown_envelope_is_skipped_but_counted() {
        let id = Uuid::new_v4();
        let envelopes = vec![
            envelope(id, 1, "Incremented", json!({"by": 2})),
            envelope(id, 2, "ResetRequested", json!({})),
            envelope(id, 3, "Incremented", json!({"by": 5})),
        ];
        let mut counter = Counter {
            id,
            ..Counter::default()
        };

        counter.load_from_envelopes(&envelopes).unwrap();

        assert_eq!(counter.total, 7);
        assert_eq!(counter.version(), 3);
    }

    #[test]
    fn test_gap_in_envelopes_is_corrupt_stream() {
        let id = Uuid::new_v4();
        let envelopes = vec![
            envelope(id, 1, "Incremented", json!({"by": 2})),
            envelope(id, 3, "Incremented", json!({"by": 5})),
        ];
        let mut counter = Counter {
            id,
            ..Counter::default()
        };

        let result = counter.load_from_envelopes(&envelopes);

        match result {
            Err(DomainError::CorruptStream {
                expected, found, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected CorruptStream, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_known_payload_is_serialization_error() {
        let id = Uuid::new_v4();
        let envelopes = vec![envelope(id, 1, "Incremented", json!({"by": "two"}))];
        let mut counter = Counter {
            id,
            ..Counter::default()
        };

        let result = counter.load_from_envelopes(&envelopes);

        assert!(matches!(result, Err(DomainError::Serialization(_))));
    }
}
