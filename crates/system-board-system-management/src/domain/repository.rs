//! Repository port for `System` aggregates.

use async_trait::async_trait;
use system_board_core::error::DomainError;
use uuid::Uuid;

use super::aggregates::System;

/// Loads and stores `System` aggregates.
#[async_trait]
pub trait SystemRepository: Send + Sync {
    /// Persists the aggregate's uncommitted events and marks them committed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stream moved since
    /// the aggregate was loaded.
    async fn save(&self, system: &mut System) -> Result<(), DomainError>;

    /// Rebuilds a system from its stream, or `None` if it has no events.
    async fn find_by_id(&self, system_id: Uuid) -> Result<Option<System>, DomainError>;
}
