//! `SystemRepository` backed by an `EventStore`.

use async_trait::async_trait;
use system_board_core::aggregate::AggregateRoot;
use system_board_core::error::DomainError;
use system_board_core::event::DomainEvent;
use system_board_core::event_store::{EventStore, ExpectedVersion, StreamName};
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::System;
use crate::domain::repository::SystemRepository;

/// Stores each system as the stream `System-{id}`.
#[derive(Debug)]
pub struct EventSourcingSystemRepository<S> {
    store: S,
}

impl<S: EventStore> EventSourcingSystemRepository<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: EventStore> SystemRepository for EventSourcingSystemRepository<S> {
    async fn save(&self, system: &mut System) -> Result<(), DomainError> {
        let envelopes: Vec<_> = system
            .uncommitted_events()
            .iter()
            .map(DomainEvent::to_envelope)
            .collect();
        if envelopes.is_empty() {
            return Ok(());
        }

        #[allow(clippy::cast_possible_wrap)]
        let prior = system.version() - envelopes.len() as i64;
        let stream_name = system.stream_name();
        self.store
            .append(&stream_name, &envelopes, ExpectedVersion::from_prior(prior))
            .await?;
        system.mark_events_as_committed();

        debug!(%stream_name, count = envelopes.len(), "system saved");
        Ok(())
    }

    async fn find_by_id(&self, system_id: Uuid) -> Result<Option<System>, DomainError> {
        let stream_name = StreamName::for_aggregate(System::AGGREGATE_TYPE, system_id);
        let envelopes = self.store.read(&stream_name).await?;
        if envelopes.is_empty() {
            return Ok(None);
        }
        System::reconstruct(system_id, &envelopes).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use system_board_test_support::{FailingEventStore, FixedClock, InMemoryEventStore};

    use super::*;
    use crate::domain::events::SystemDetails;
    use crate::domain::value_objects::{
        CriticalityLevel, HostConfiguration, SecurityClassification, SystemName, SystemPackages,
        SystemType,
    };

    fn details() -> SystemDetails {
        SystemDetails {
            name: SystemName::new("ledger-db").unwrap(),
            system_type: SystemType::Database,
            host: HostConfiguration::new(16, 128, 2000, true).unwrap(),
            criticality: CriticalityLevel::new(5).unwrap(),
            packages: SystemPackages::empty(),
            security_classification: SecurityClassification::Restricted,
        }
    }

    #[tokio::test]
    async fn test_save_appends_with_no_stream_and_commits() {
        // Arrange
        let repo = EventSourcingSystemRepository::new(InMemoryEventStore::new());
        let mut system = System::register(details(), Uuid::new_v4(), &FixedClock::default_instant());

        // Act
        repo.save(&mut system).await.unwrap();

        // Assert
        assert!(system.uncommitted_events().is_empty());
        let appends = repo.store().accepted_appends();
        assert_eq!(appends.len(), 1);
        assert_eq!(appends[0].0, system.stream_name());
        assert_eq!(appends[0].1, ExpectedVersion::NoStream);
        assert_eq!(appends[0].2, 1);
    }

    #[tokio::test]
    async fn test_save_without_changes_is_noop() {
        let repo = EventSourcingSystemRepository::new(InMemoryEventStore::new());
        let mut system = System::new(Uuid::new_v4());

        repo.save(&mut system).await.unwrap();

        assert!(repo.store().accepted_appends().is_empty());
    }

    #[tokio::test]
    async fn test_save_against_moved_stream_conflicts_and_keeps_events() {
        // Arrange
        let repo = EventSourcingSystemRepository::new(InMemoryEventStore::new());
        let mut system = System::register(details(), Uuid::new_v4(), &FixedClock::default_instant());
        let envelopes: Vec<_> = system
            .uncommitted_events()
            .iter()
            .map(DomainEvent::to_envelope)
            .collect();
        repo.store()
            .append(&system.stream_name(), &envelopes, ExpectedVersion::NoStream)
            .await
            .unwrap();

        // Act
        let result = repo.save(&mut system).await;

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::ConcurrencyConflict {
                expected: 0,
                actual: 1,
                ..
            })
        ));
        assert_eq!(system.uncommitted_events().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_id_reconstructs_saved_system() {
        // Arrange
        let repo = EventSourcingSystemRepository::new(InMemoryEventStore::new());
        let mut system = System::register(details(), Uuid::new_v4(), &FixedClock::default_instant());
        repo.save(&mut system).await.unwrap();

        // Act
        let found = repo.find_by_id(system.aggregate_id()).await.unwrap().unwrap();

        // Assert
        assert_eq!(found.aggregate_id(), system.aggregate_id());
        assert_eq!(found.version(), 1);
        assert_eq!(found.profile(), system.profile());
    }

    #[tokio::test]
    async fn test_find_by_id_of_unknown_system_is_none() {
        let repo = EventSourcingSystemRepository::new(InMemoryEventStore::new());

        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let repo = EventSourcingSystemRepository::new(FailingEventStore);

        let result = repo.find_by_id(Uuid::new_v4()).await;

        assert!(matches!(result, Err(DomainError::Transport(_))));
    }
}
