//! Query handlers for the System Management context.

use chrono::{DateTime, Utc};
use serde::Serialize;
use system_board_core::aggregate::AggregateRoot;
use system_board_core::error::DomainError;
use uuid::Uuid;

use crate::domain::repository::SystemRepository;
use crate::domain::value_objects::{
    CriticalityLevel, HostConfiguration, SecurityClassification, SystemName, SystemPackages,
    SystemStatus, SystemType,
};

/// Read-only projection of a registered system.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemView {
    pub system_id: Uuid,
    pub name: SystemName,
    #[serde(rename = "type")]
    pub system_type: SystemType,
    pub status: SystemStatus,
    pub host: HostConfiguration,
    pub criticality: CriticalityLevel,
    pub packages: SystemPackages,
    pub security_classification: SecurityClassification,
    pub created_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub decommission_date: Option<DateTime<Utc>>,
    pub version: i64,
}

/// Returns the current view of a system.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the system was never
/// registered.
pub async fn get_system_by_id(
    system_id: Uuid,
    repo: &dyn SystemRepository,
) -> Result<SystemView, DomainError> {
    let system = repo
        .find_by_id(system_id)
        .await?
        .ok_or(DomainError::AggregateNotFound(system_id))?;
    let profile = system
        .profile()
        .ok_or(DomainError::AggregateNotFound(system_id))?;

    Ok(SystemView {
        system_id,
        name: profile.details.name.clone(),
        system_type: profile.details.system_type,
        status: profile.status,
        host: profile.details.host.clone(),
        criticality: profile.details.criticality,
        packages: profile.details.packages.clone(),
        security_classification: profile.details.security_classification,
        created_date: profile.created_date,
        last_modified: profile.last_modified,
        decommission_date: profile.decommission_date,
        version: system.version(),
    })
}
