//! Command handlers for the System Management context.
//!
//! Handlers validate the command, drive the aggregate, and publish the
//! resulting events. Persistence happens downstream, when the subscriber
//! appends the published events to the aggregate's stream.

use system_board_core::aggregate::AggregateRoot;
use system_board_core::clock::Clock;
use system_board_core::error::DomainError;
use system_board_core::event::{DomainEvent, EventEnvelope};
use system_board_core::publisher::EventPublisher;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::System;
use crate::domain::commands::RegisterSystem;

/// Publishes every uncommitted event of `system`, then marks them committed.
/// On failure the events stay uncommitted.
///
/// # Errors
///
/// Returns the publisher's error.
pub async fn publish_uncommitted(
    system: &mut System,
    publisher: &dyn EventPublisher,
) -> Result<(), DomainError> {
    let envelopes: Vec<EventEnvelope> = system
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_envelope)
        .collect();
    if envelopes.is_empty() {
        return Ok(());
    }
    publisher.publish_all(&envelopes).await?;
    system.mark_events_as_committed();
    Ok(())
}

/// Handles the `RegisterSystem` command and returns the new system's id.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an invalid command, or the
/// publisher's error if the registration could not be published.
#[tracing::instrument(skip_all, fields(correlation_id = %command.correlation_id))]
pub async fn handle_register_system(
    command: &RegisterSystem,
    clock: &dyn Clock,
    publisher: &dyn EventPublisher,
) -> Result<Uuid, DomainError> {
    let details = command.to_details()?;
    let mut system = System::register(details, command.correlation_id, clock);

    publish_uncommitted(&mut system, publisher).await?;

    let system_id = system.aggregate_id();
    info!(%system_id, "system registered");
    Ok(system_id)
}

#[cfg(test)]
mod tests {
    use system_board_test_support::{
        FailingEventPublisher, FixedClock, RecordingEventPublisher,
    };

    use super::*;
    use crate::domain::commands::{HostSpec, PackageSpec};

    fn command() -> RegisterSystem {
        RegisterSystem {
            correlation_id: Uuid::new_v4(),
            name: "billing-api".into(),
            system_type: "API".into(),
            host: HostSpec {
                cpu: 4,
                memory: 16,
                storage: 200,
                encryption_enabled: true,
            },
            packages: vec![PackageSpec {
                name: "nginx".into(),
                version: "1.25.3".into(),
                dependencies: vec!["openssl".into()],
                vulnerabilities: vec![],
            }],
            security_classification: "INTERNAL".into(),
            criticality: 3,
        }
    }

    #[tokio::test]
    async fn test_register_publishes_one_registered_event() {
        // Arrange
        let clock = FixedClock::default_instant();
        let publisher = RecordingEventPublisher::new();
        let cmd = command();

        // Act
        let system_id = handle_register_system(&cmd, &clock, &publisher)
            .await
            .unwrap();

        // Assert
        let published = publisher.published();
        assert_eq!(published.len(), 1);
        let event = &published[0];
        assert_eq!(event.event_type(), "SystemRegistered");
        assert_eq!(event.aggregate_id(), system_id);
        assert_eq!(event.aggregate_version(), 1);
        assert_eq!(event.metadata().correlation_id, cmd.correlation_id);
        assert_eq!(event.metadata().occurred_on, clock.0);
        assert_eq!(event.payload()["name"], "billing-api");
        assert_eq!(event.payload()["packages"][0]["name"], "nginx");
    }

    #[tokio::test]
    async fn test_invalid_command_publishes_nothing() {
        // Arrange
        let publisher = RecordingEventPublisher::new();
        let mut cmd = command();
        cmd.criticality = 9;

        // Act
        let result = handle_register_system(&cmd, &FixedClock::default_instant(), &publisher).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_propagates() {
        let result =
            handle_register_system(&command(), &FixedClock::default_instant(), &FailingEventPublisher)
                .await;

        assert!(matches!(result, Err(DomainError::Transport(_))));
    }

    #[tokio::test]
    async fn test_failed_publish_keeps_events_uncommitted() {
        // Arrange
        let details = command().to_details().unwrap();
        let mut system = System::register(details, Uuid::new_v4(), &FixedClock::default_instant());

        // Act
        let result = publish_uncommitted(&mut system, &FailingEventPublisher).await;

        // Assert
        assert!(result.is_err());
        assert_eq!(system.uncommitted_events().len(), 1);
    }

    #[tokio::test]
    async fn test_successful_publish_commits_events() {
        let details = command().to_details().unwrap();
        let mut system = System::register(details, Uuid::new_v4(), &FixedClock::default_instant());
        let publisher = RecordingEventPublisher::new();

        publish_uncommitted(&mut system, &publisher).await.unwrap();

        assert!(system.uncommitted_events().is_empty());
        assert_eq!(system.version(), 1);
        assert_eq!(publisher.published().len(), 1);
    }
}
