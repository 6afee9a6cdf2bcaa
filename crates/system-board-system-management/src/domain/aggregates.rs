//! Aggregate roots for the System Management context.

use chrono::{DateTime, Utc};
use system_board_core::aggregate::{AggregateRoot, EventHistory};
use system_board_core::clock::Clock;
use system_board_core::error::DomainError;
use system_board_core::event::{EventEnvelope, EventMetadata};
use uuid::Uuid;

use super::events::{
    SYSTEM_AGGREGATE_TYPE, SYSTEM_REGISTERED_EVENT_TYPE, SystemDetails, SystemEvent,
    SystemEventKind, SystemRegistered,
};
use super::value_objects::SystemStatus;

/// State of a registered system.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemProfile {
    pub details: SystemDetails,
    pub status: SystemStatus,
    pub created_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub decommission_date: Option<DateTime<Utc>>,
}

/// The aggregate root for a managed system.
#[derive(Debug)]
pub struct System {
    id: Uuid,
    /// `None` until the registration event is applied.
    profile: Option<SystemProfile>,
    history: EventHistory<SystemEvent>,
}

impl System {
    /// Creates an empty aggregate to replay history into.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            profile: None,
            history: EventHistory::default(),
        }
    }

    /// Registers a new system under a fresh id, producing a `SystemRegistered`
    /// event at version 1.
    #[must_use]
    pub fn register(details: SystemDetails, correlation_id: Uuid, clock: &dyn Clock) -> Self {
        let mut system = Self::new(Uuid::new_v4());
        let event = SystemEvent {
            metadata: EventMetadata::new(
                SYSTEM_REGISTERED_EVENT_TYPE,
                SYSTEM_AGGREGATE_TYPE,
                system.id,
                system.version() + 1,
                correlation_id,
                clock.now(),
            ),
            kind: SystemEventKind::SystemRegistered(SystemRegistered {
                system_id: system.id,
                details,
            }),
        };
        system.apply_event(event, true);
        system
    }

    /// Rebuilds a system from its stored stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CorruptStream` or `DomainError::Serialization`
    /// if the stream cannot be replayed.
    pub fn reconstruct(id: Uuid, envelopes: &[EventEnvelope]) -> Result<Self, DomainError> {
        let mut system = Self::new(id);
        system.load_from_envelopes(envelopes)?;
        Ok(system)
    }

    #[must_use]
    pub fn profile(&self) -> Option<&SystemProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.status.is_active())
    }

    #[must_use]
    pub fn has_no_packages(&self) -> bool {
        self.profile
            .as_ref()
            .is_none_or(|p| p.details.packages.is_empty())
    }

    #[must_use]
    pub fn has_encryption_enabled(&self) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|p| p.details.host.is_encryption_enabled())
    }

    #[must_use]
    pub fn has_security_compliant_packages(&self) -> bool {
        self.profile
            .as_ref()
            .is_none_or(|p| p.details.packages.all_security_compliant())
    }
}

impl AggregateRoot for System {
    type Event = SystemEvent;

    const AGGREGATE_TYPE: &'static str = SYSTEM_AGGREGATE_TYPE;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn history(&self) -> &EventHistory<SystemEvent> {
        &self.history
    }

    fn history_mut(&mut self) -> &mut EventHistory<SystemEvent> {
        &mut self.history
    }

    fn apply(&mut self, event: &SystemEvent) {
        match &event.kind {
            SystemEventKind::SystemRegistered(payload) => {
                self.profile = Some(SystemProfile {
                    details: payload.details.clone(),
                    status: SystemStatus::Active,
                    created_date: event.metadata.occurred_on,
                    last_modified: event.metadata.occurred_on,
                    decommission_date: None,
                });
            }
        }
    }
}
