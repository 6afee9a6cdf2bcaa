//! Domain events for the System Management context.

use serde::{Deserialize, Serialize};
use system_board_core::error::DomainError;
use system_board_core::event::{DecodeEvent, DomainEvent, EventEnvelope, EventMetadata};
use uuid::Uuid;

use super::value_objects::{
    CriticalityLevel, HostConfiguration, SecurityClassification, SystemName, SystemPackages,
    SystemType,
};

/// Aggregate type of the `System` aggregate.
pub const SYSTEM_AGGREGATE_TYPE: &str = "System";

/// Event type tag of [`SystemRegistered`].
pub const SYSTEM_REGISTERED_EVENT_TYPE: &str = "SystemRegistered";

/// The validated description of a system, as given at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDetails {
    pub name: SystemName,
    #[serde(rename = "type")]
    pub system_type: SystemType,
    pub host: HostConfiguration,
    pub criticality: CriticalityLevel,
    pub packages: SystemPackages,
    pub security_classification: SecurityClassification,
}

/// Emitted when a system is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemRegistered {
    /// The system identifier.
    pub system_id: Uuid,
    #[serde(flatten)]
    pub details: SystemDetails,
}

/// Event payload variants for the System Management context.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemEventKind {
    /// A system has been registered.
    SystemRegistered(SystemRegistered),
}

/// Domain event envelope for the System Management context.
#[derive(Debug, Clone)]
pub struct SystemEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: SystemEventKind,
}

impl DomainEvent for SystemEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            SystemEventKind::SystemRegistered(_) => SYSTEM_REGISTERED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types with string keys is infallible.
        match &self.kind {
            SystemEventKind::SystemRegistered(payload) => serde_json::to_value(payload)
                .expect("SystemRegistered serialization is infallible"),
        }
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

impl DecodeEvent for SystemEvent {
    fn from_envelope(envelope: &EventEnvelope) -> Result<Option<Self>, DomainError> {
        let kind = match envelope.event_type() {
            SYSTEM_REGISTERED_EVENT_TYPE => SystemEventKind::SystemRegistered(
                serde_json::from_value(envelope.payload().clone()).map_err(|e| {
                    DomainError::Serialization(format!(
                        "{SYSTEM_REGISTERED_EVENT_TYPE} payload: {e}"
                    ))
                })?,
            ),
            _ => return Ok(None),
        };
        Ok(Some(Self {
            metadata: envelope.metadata().clone(),
            kind,
        }))
    }
}
