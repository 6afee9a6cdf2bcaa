//! Domain event abstractions.
//!
//! Bounded contexts model their events as a typed envelope (`metadata` plus a
//! sum-type `kind`) implementing [`DomainEvent`]. Everything that crosses a
//! process boundary (the bus, the event store) travels as the type-erased
//! [`EventEnvelope`], and [`DecodeEvent`] is the registry that turns an
//! envelope back into a typed event by its `event_type` tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::event_store::StreamName;

/// Metadata attached to every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// Unique event identifier, never reused.
    pub event_id: Uuid,
    /// Type tag for routing and decoding.
    pub event_type: String,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Kind of the owning aggregate (`System`, ...).
    pub aggregate_type: String,
    /// 1-based position of this event in its aggregate's history.
    pub aggregate_version: i64,
    /// Timestamp of event creation.
    pub occurred_on: DateTime<Utc>,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to the event/command that caused it.
    #[serde(default)]
    pub causation_id: Option<Uuid>,
}

impl EventMetadata {
    /// Builds metadata for a freshly produced event with a new event id.
    #[must_use]
    pub fn new(
        event_type: &str,
        aggregate_type: &str,
        aggregate_id: Uuid,
        aggregate_version: i64,
        correlation_id: Uuid,
        occurred_on: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event_type.to_owned(),
            aggregate_id,
            aggregate_type: aggregate_type.to_owned(),
            aggregate_version,
            occurred_on,
            correlation_id,
            causation_id: None,
        }
    }

    /// Sets the causation id.
    #[must_use]
    pub fn caused_by(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }
}

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for routing and decoding).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this event.
    fn metadata(&self) -> &EventMetadata;

    /// Erases the concrete type into the wire/storage envelope.
    fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope::new(self.metadata().clone(), self.to_payload())
    }
}

/// Decoding registry for a context's event sum type.
pub trait DecodeEvent: Sized {
    /// Decodes an envelope into a typed event.
    ///
    /// Returns `Ok(None)` when the envelope's `event_type` is not one this
    /// type knows about.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` when the tag is known but the
    /// payload does not match its shape.
    fn from_envelope(envelope: &EventEnvelope) -> Result<Option<Self>, DomainError>;
}

/// Type-erased, immutable event as published to the bus and kept in the
/// event store.
///
/// Serialized shape: `{eventId, eventType, aggregateId, aggregateType,
/// aggregateVersion, occurredOn, correlationId, causationId, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    metadata: EventMetadata,
    payload: serde_json::Value,
}

impl EventEnvelope {
    /// Creates a new envelope.
    #[must_use]
    pub fn new(metadata: EventMetadata, payload: serde_json::Value) -> Self {
        Self { metadata, payload }
    }

    /// Returns the full metadata block.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn event_id(&self) -> Uuid {
        self.metadata.event_id
    }

    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.metadata.event_type
    }

    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        self.metadata.aggregate_id
    }

    #[must_use]
    pub fn aggregate_type(&self) -> &str {
        &self.metadata.aggregate_type
    }

    #[must_use]
    pub fn aggregate_version(&self) -> i64 {
        self.metadata.aggregate_version
    }

    #[must_use]
    pub fn occurred_on(&self) -> DateTime<Utc> {
        self.metadata.occurred_on
    }

    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.metadata.correlation_id
    }

    #[must_use]
    pub fn causation_id(&self) -> Option<Uuid> {
        self.metadata.causation_id
    }

    /// Returns the type-specific payload.
    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Returns the stream this event belongs to (`{aggregateType}-{aggregateId}`).
    #[must_use]
    pub fn stream_name(&self) -> StreamName {
        StreamName::for_aggregate(self.aggregate_type(), self.aggregate_id())
    }

    /// Returns a copy carrying a different event type tag.
    ///
    /// Used by consumers that take the tag from a transport header.
    #[must_use]
    pub fn with_event_type(&self, event_type: &str) -> Self {
        let mut metadata = self.metadata.clone();
        event_type.clone_into(&mut metadata.event_type);
        Self {
            metadata,
            payload: self.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use super::{EventEnvelope, EventMetadata};

    fn sample_envelope() -> EventEnvelope {
        let occurred_on = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let metadata = EventMetadata::new(
            "SystemRegistered",
            "System",
            Uuid::new_v4(),
            1,
            Uuid::new_v4(),
            occurred_on,
        );
        EventEnvelope::new(metadata, json!({"name": "scada-gateway"}))
    }

    #[test]
    fn test_envelope_serializes_with_camel_case_wire_fields() {
        // Arrange
        let envelope = sample_envelope();

        // Act
        let value = serde_json::to_value(&envelope).unwrap();

        // Assert
        assert_eq!(value["eventId"], json!(envelope.event_id()));
        assert_eq!(value["eventType"], "SystemRegistered");
        assert_eq!(value["aggregateType"], "System");
        assert_eq!(value["aggregateVersion"], 1);
        assert_eq!(value["occurredOn"], "2026-01-15T10:00:00Z");
        assert!(value["causationId"].is_null());
        assert_eq!(value["payload"]["name"], "scada-gateway");
    }

    #[test]
    fn test_envelope_decodes_without_causation_id() {
        // Arrange
        let envelope = sample_envelope();
        let mut value = serde_json::to_value(&envelope).unwrap();
        value.as_object_mut().unwrap().remove("causationId");

        // Act
        let decoded: EventEnvelope = serde_json::from_value(value).unwrap();

        // Assert
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_caused_by_sets_causation_and_keeps_event_id() {
        let causation = Uuid::new_v4();
        let metadata = EventMetadata::new(
            "TaskCreated",
            "Task",
            Uuid::new_v4(),
            3,
            Uuid::new_v4(),
            Utc::now(),
        );
        let event_id = metadata.event_id;

        let caused = metadata.caused_by(causation);

        assert_eq!(caused.causation_id, Some(causation));
        assert_eq!(caused.event_id, event_id);
    }

    #[test]
    fn test_stream_name_is_aggregate_type_dash_id() {
        let envelope = sample_envelope();

        assert_eq!(
            envelope.stream_name().as_str(),
            format!("System-{}", envelope.aggregate_id())
        );
    }

    #[test]
    fn test_with_event_type_leaves_original_untouched() {
        let envelope = sample_envelope();

        let retagged = envelope.with_event_type("SystemSecurityAlert");

        assert_eq!(envelope.event_type(), "SystemRegistered");
        assert_eq!(retagged.event_type(), "SystemSecurityAlert");
        assert_eq!(retagged.event_id(), envelope.event_id());
    }
}
