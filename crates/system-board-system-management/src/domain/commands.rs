//! Commands for the System Management context.

use std::str::FromStr;

use system_board_core::command::Command;
use system_board_core::error::DomainError;
use uuid::Uuid;

use super::events::SystemDetails;
use super::value_objects::{
    CriticalityLevel, HostConfiguration, Package, SecurityClassification, SystemName,
    SystemPackages, SystemType, VulnerabilityInfo,
};

/// Raw host sizing as submitted.
#[derive(Debug, Clone)]
pub struct HostSpec {
    pub cpu: u32,
    pub memory: u32,
    pub storage: u32,
    pub encryption_enabled: bool,
}

/// Raw vulnerability report as submitted.
#[derive(Debug, Clone)]
pub struct VulnerabilitySpec {
    pub cve_id: String,
    pub severity: String,
    pub cvss_score: f64,
}

/// Raw installed package as submitted.
#[derive(Debug, Clone)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
    pub dependencies: Vec<String>,
    pub vulnerabilities: Vec<VulnerabilitySpec>,
}

/// Command to register a new system.
#[derive(Debug, Clone)]
pub struct RegisterSystem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    pub name: String,
    /// One of `WEB`, `API`, `DATABASE`, `BATCH`, `MIDDLEWARE`, `MONITORING`.
    pub system_type: String,
    pub host: HostSpec,
    pub packages: Vec<PackageSpec>,
    /// One of `PUBLIC`, `INTERNAL`, `CONFIDENTIAL`, `RESTRICTED`.
    pub security_classification: String,
    pub criticality: i64,
}

impl RegisterSystem {
    /// Validates every field into the value objects of a registration.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` naming the first invalid field.
    pub fn to_details(&self) -> Result<SystemDetails, DomainError> {
        let packages = self
            .packages
            .iter()
            .map(PackageSpec::to_package)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SystemDetails {
            name: SystemName::new(&self.name)?,
            system_type: SystemType::from_str(&self.system_type)?,
            host: HostConfiguration::new(
                self.host.cpu,
                self.host.memory,
                self.host.storage,
                self.host.encryption_enabled,
            )?,
            criticality: CriticalityLevel::new(self.criticality)?,
            packages: SystemPackages::new(packages)?,
            security_classification: SecurityClassification::from_str(
                &self.security_classification,
            )?,
        })
    }
}

impl PackageSpec {
    fn to_package(&self) -> Result<Package, DomainError> {
        let vulnerabilities = self
            .vulnerabilities
            .iter()
            .map(|v| VulnerabilityInfo::new(&v.cve_id, &v.severity, v.cvss_score))
            .collect::<Result<Vec<_>, _>>()?;
        Package::new(
            &self.name,
            &self.version,
            self.dependencies.clone(),
            vulnerabilities,
        )
    }
}

impl Command for RegisterSystem {
    fn command_type(&self) -> &'static str {
        "RegisterSystem"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> RegisterSystem {
        RegisterSystem {
            correlation_id: Uuid::new_v4(),
            name: "  billing-api ".into(),
            system_type: "API".into(),
            host: HostSpec {
                cpu: 8,
                memory: 32,
                storage: 500,
                encryption_enabled: true,
            },
            packages: vec![PackageSpec {
                name: "openssl".into(),
                version: "3.0.2".into(),
                dependencies: vec![],
                vulnerabilities: vec![VulnerabilitySpec {
                    cve_id: "CVE-2023-0286".into(),
                    severity: "HIGH".into(),
                    cvss_score: 7.4,
                }],
            }],
            security_classification: "CONFIDENTIAL".into(),
            criticality: 4,
        }
    }

    #[test]
    fn test_valid_command_converts_to_details() {
        let details = command().to_details().unwrap();

        assert_eq!(details.name.as_str(), "billing-api");
        assert_eq!(details.system_type, SystemType::Api);
        assert_eq!(details.criticality.value(), 4);
        assert_eq!(details.packages.len(), 1);
        assert_eq!(
            details.security_classification,
            SecurityClassification::Confidential
        );
    }

    #[test]
    fn test_unknown_system_type_is_rejected() {
        let mut cmd = command();
        cmd.system_type = "MAINFRAME".into();

        assert!(matches!(cmd.to_details(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_critical_vulnerability_is_rejected() {
        let mut cmd = command();
        cmd.packages[0].vulnerabilities[0].cvss_score = 9.8;

        assert!(matches!(cmd.to_details(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_command_type_and_correlation() {
        let cmd = command();

        assert_eq!(cmd.command_type(), "RegisterSystem");
        assert_eq!(Command::correlation_id(&cmd), cmd.correlation_id);
    }
}
