//! Value objects for the System Management context.
//!
//! Constructors validate; deserialization does not, so that events recorded
//! under older rules still replay.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use system_board_core::error::DomainError;

/// Human-readable system name, 1 to 255 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemName(String);

impl SystemName {
    pub const MAX_LENGTH: usize = 255;

    /// Creates a system name from `value`, trimmed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the trimmed value is empty or
    /// longer than [`SystemName::MAX_LENGTH`] characters.
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let length = trimmed.chars().count();
        if length == 0 || length > Self::MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "system name must be between 1 and {} characters",
                Self::MAX_LENGTH
            )));
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses an upper-case enum tag case-insensitively.
fn parse_tag<T: Copy>(kind: &str, value: &str, variants: &[(&str, T)]) -> Result<T, DomainError> {
    let upper = value.trim().to_ascii_uppercase();
    variants
        .iter()
        .find(|(tag, _)| *tag == upper)
        .map(|(_, variant)| *variant)
        .ok_or_else(|| DomainError::Validation(format!("invalid {kind}: {value}")))
}

/// What kind of workload a system runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemType {
    Web,
    Api,
    Database,
    Batch,
    Middleware,
    Monitoring,
}

impl SystemType {
    const TAGS: [(&'static str, Self); 6] = [
        ("WEB", Self::Web),
        ("API", Self::Api),
        ("DATABASE", Self::Database),
        ("BATCH", Self::Batch),
        ("MIDDLEWARE", Self::Middleware),
        ("MONITORING", Self::Monitoring),
    ];
}

impl FromStr for SystemType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_tag("system type", value, &Self::TAGS)
    }
}

/// Lifecycle status of a registered system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemStatus {
    Active,
    Inactive,
    Maintenance,
    Decommissioned,
}

impl SystemStatus {
    const TAGS: [(&'static str, Self); 4] = [
        ("ACTIVE", Self::Active),
        ("INACTIVE", Self::Inactive),
        ("MAINTENANCE", Self::Maintenance),
        ("DECOMMISSIONED", Self::Decommissioned),
    ];

    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    #[must_use]
    pub fn is_decommissioned(self) -> bool {
        self == Self::Decommissioned
    }
}

impl FromStr for SystemStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_tag("system status", value, &Self::TAGS)
    }
}

/// Data-handling classification, ordered from least to most restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityClassification {
    Public,
    Internal,
    Confidential,
    Restricted,
}

impl SecurityClassification {
    const TAGS: [(&'static str, Self); 4] = [
        ("PUBLIC", Self::Public),
        ("INTERNAL", Self::Internal),
        ("CONFIDENTIAL", Self::Confidential),
        ("RESTRICTED", Self::Restricted),
    ];

    /// Numeric level, 1 (public) to 4 (restricted).
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::Public => 1,
            Self::Internal => 2,
            Self::Confidential => 3,
            Self::Restricted => 4,
        }
    }

    #[must_use]
    pub fn is_high_security(self) -> bool {
        self >= Self::Confidential
    }
}

impl FromStr for SecurityClassification {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_tag("security classification", value, &Self::TAGS)
    }
}

/// Business criticality, 1 (lowest) to 5 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriticalityLevel(u8);

impl CriticalityLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    pub const HIGH_THRESHOLD: u8 = 4;

    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `value` is outside 1..=5.
    pub fn new(value: i64) -> Result<Self, DomainError> {
        u8::try_from(value)
            .ok()
            .filter(|level| (Self::MIN..=Self::MAX).contains(level))
            .map(Self)
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "criticality level must be between {} and {}, got {value}",
                    Self::MIN,
                    Self::MAX
                ))
            })
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_high(self) -> bool {
        self.0 >= Self::HIGH_THRESHOLD
    }
}

/// Sizing and encryption of the host a system runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfiguration {
    cpu: u32,
    memory: u32,
    storage: u32,
    encryption_enabled: bool,
}

impl HostConfiguration {
    pub const MAX_CPU_CORES: u32 = 256;
    pub const MAX_MEMORY_GB: u32 = 2048;
    pub const MAX_STORAGE_GB: u32 = 100_000;

    /// Creates a host configuration; memory and storage are in GB.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if any size is zero or above its
    /// maximum.
    pub fn new(
        cpu: u32,
        memory: u32,
        storage: u32,
        encryption_enabled: bool,
    ) -> Result<Self, DomainError> {
        for (field, value, max) in [
            ("cpu cores", cpu, Self::MAX_CPU_CORES),
            ("memory (GB)", memory, Self::MAX_MEMORY_GB),
            ("storage (GB)", storage, Self::MAX_STORAGE_GB),
        ] {
            if !(1..=max).contains(&value) {
                return Err(DomainError::Validation(format!(
                    "{field} must be between 1 and {max}, got {value}"
                )));
            }
        }
        Ok(Self {
            cpu,
            memory,
            storage,
            encryption_enabled,
        })
    }

    #[must_use]
    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    #[must_use]
    pub fn memory(&self) -> u32 {
        self.memory
    }

    #[must_use]
    pub fn storage(&self) -> u32 {
        self.storage
    }

    #[must_use]
    pub fn is_encryption_enabled(&self) -> bool {
        self.encryption_enabled
    }
}

/// A known vulnerability of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityInfo {
    cve_id: String,
    severity: String,
    cvss_score: f64,
}

impl VulnerabilityInfo {
    pub const HIGH_SEVERITY_THRESHOLD: f64 = 7.0;
    pub const CRITICAL_SEVERITY_THRESHOLD: f64 = 9.0;

    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `cve_id` is not `CVE-YYYY-NNNN`
    /// (four or more trailing digits), `severity` is empty, or `cvss_score`
    /// is outside 0.0..=10.0.
    pub fn new(cve_id: &str, severity: &str, cvss_score: f64) -> Result<Self, DomainError> {
        if !is_cve_id(cve_id) {
            return Err(DomainError::Validation(format!(
                "CVE id must match CVE-YYYY-NNNN, got {cve_id}"
            )));
        }
        if severity.trim().is_empty() {
            return Err(DomainError::Validation("severity is required".into()));
        }
        if !(0.0..=10.0).contains(&cvss_score) {
            return Err(DomainError::Validation(format!(
                "CVSS score must be between 0 and 10, got {cvss_score}"
            )));
        }
        Ok(Self {
            cve_id: cve_id.to_owned(),
            severity: severity.to_owned(),
            cvss_score,
        })
    }

    #[must_use]
    pub fn cve_id(&self) -> &str {
        &self.cve_id
    }

    #[must_use]
    pub fn severity(&self) -> &str {
        &self.severity
    }

    #[must_use]
    pub fn cvss_score(&self) -> f64 {
        self.cvss_score
    }

    #[must_use]
    pub fn is_high_severity(&self) -> bool {
        self.cvss_score >= Self::HIGH_SEVERITY_THRESHOLD
    }

    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.cvss_score >= Self::CRITICAL_SEVERITY_THRESHOLD
    }
}

fn is_cve_id(value: &str) -> bool {
    let mut parts = value.splitn(3, '-');
    let (Some("CVE"), Some(year), Some(number)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    year.len() == 4 && digits(year) && number.len() >= 4 && digits(number)
}

/// An installed software package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default)]
    vulnerabilities: Vec<VulnerabilityInfo>,
}

impl Package {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `name` or `version` is empty.
    pub fn new(
        name: &str,
        version: &str,
        dependencies: Vec<String>,
        vulnerabilities: Vec<VulnerabilityInfo>,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("package name is required".into()));
        }
        if version.trim().is_empty() {
            return Err(DomainError::Validation(format!(
                "package {name} needs a version"
            )));
        }
        Ok(Self {
            name: name.to_owned(),
            version: version.to_owned(),
            dependencies,
            vulnerabilities,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    #[must_use]
    pub fn vulnerabilities(&self) -> &[VulnerabilityInfo] {
        &self.vulnerabilities
    }

    #[must_use]
    pub fn has_known_vulnerabilities(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }

    #[must_use]
    pub fn has_high_severity_vulnerabilities(&self) -> bool {
        self.vulnerabilities.iter().any(VulnerabilityInfo::is_high_severity)
    }

    #[must_use]
    pub fn has_critical_vulnerabilities(&self) -> bool {
        self.vulnerabilities.iter().any(VulnerabilityInfo::is_critical)
    }

    #[must_use]
    pub fn is_security_compliant(&self) -> bool {
        !self.has_critical_vulnerabilities()
    }
}

/// The packages installed on a system: unique by name, none with a critical
/// vulnerability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemPackages(Vec<Package>);

impl SystemPackages {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `DomainError::Validation` on a duplicate package name or a
    /// package with a critical vulnerability.
    pub fn new(packages: Vec<Package>) -> Result<Self, DomainError> {
        Self::validate(&packages)?;
        Ok(Self(packages))
    }

    fn validate(packages: &[Package]) -> Result<(), DomainError> {
        let mut names = HashSet::new();
        for package in packages {
            if !names.insert(package.name()) {
                return Err(DomainError::Validation(format!(
                    "duplicate package name: {}",
                    package.name()
                )));
            }
            if package.has_critical_vulnerabilities() {
                return Err(DomainError::Validation(format!(
                    "package {} has critical vulnerabilities and cannot be added",
                    package.name()
                )));
            }
        }
        Ok(())
    }

    /// Returns a copy with `package` added.
    ///
    /// # Errors
    ///
    /// Same rules as [`SystemPackages::new`].
    pub fn add(&self, package: Package) -> Result<Self, DomainError> {
        let mut packages = self.0.clone();
        packages.push(package);
        Self::new(packages)
    }

    /// Returns a copy without the package called `name`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no such package exists.
    pub fn remove(&self, name: &str) -> Result<Self, DomainError> {
        if self.get(name).is_none() {
            return Err(DomainError::Validation(format!("package {name} not found")));
        }
        Ok(Self(
            self.0.iter().filter(|p| p.name() != name).cloned().collect(),
        ))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.0.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn has_vulnerabilities(&self) -> bool {
        self.0.iter().any(Package::has_known_vulnerabilities)
    }

    pub fn vulnerable_packages(&self) -> impl Iterator<Item = &Package> {
        self.0.iter().filter(|p| p.has_known_vulnerabilities())
    }

    #[must_use]
    pub fn all_security_compliant(&self) -> bool {
        self.0.iter().all(Package::is_security_compliant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, scores: &[f64]) -> Package {
        let vulnerabilities = scores
            .iter()
            .enumerate()
            .map(|(i, score)| {
                VulnerabilityInfo::new(&format!("CVE-2024-{:04}", 1000 + i), "HIGH", *score)
                    .unwrap()
            })
            .collect();
        Package::new(name, "1.0.0", Vec::new(), vulnerabilities).unwrap()
    }

    #[test]
    fn test_system_name_is_trimmed() {
        let name = SystemName::new("  billing-api  ").unwrap();

        assert_eq!(name.as_str(), "billing-api");
    }

    #[test]
    fn test_system_name_bounds() {
        assert!(SystemName::new("   ").is_err());
        assert!(SystemName::new(&"x".repeat(255)).is_ok());
        assert!(matches!(
            SystemName::new(&"x".repeat(256)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_enum_tags_parse_case_insensitively() {
        assert_eq!("web".parse::<SystemType>().unwrap(), SystemType::Web);
        assert_eq!(
            "Restricted".parse::<SecurityClassification>().unwrap(),
            SecurityClassification::Restricted
        );
        assert_eq!(
            "MAINTENANCE".parse::<SystemStatus>().unwrap(),
            SystemStatus::Maintenance
        );
        assert!("MAINFRAME".parse::<SystemType>().is_err());
    }

    #[test]
    fn test_security_classification_levels_are_ordered() {
        assert_eq!(SecurityClassification::Public.level(), 1);
        assert_eq!(SecurityClassification::Restricted.level(), 4);
        assert!(SecurityClassification::Internal < SecurityClassification::Confidential);
        assert!(SecurityClassification::Confidential.is_high_security());
        assert!(!SecurityClassification::Internal.is_high_security());
    }

    #[test]
    fn test_criticality_range_and_threshold() {
        assert!(CriticalityLevel::new(0).is_err());
        assert!(CriticalityLevel::new(6).is_err());
        assert!(CriticalityLevel::new(-1).is_err());
        assert!(!CriticalityLevel::new(3).unwrap().is_high());
        assert!(CriticalityLevel::new(4).unwrap().is_high());
    }

    #[test]
    fn test_host_configuration_limits() {
        assert!(HostConfiguration::new(256, 2048, 100_000, true).is_ok());
        assert!(HostConfiguration::new(0, 16, 100, false).is_err());
        assert!(HostConfiguration::new(8, 2049, 100, false).is_err());
        assert!(HostConfiguration::new(8, 16, 100_001, false).is_err());
    }

    #[test]
    fn test_cve_id_format() {
        assert!(VulnerabilityInfo::new("CVE-2024-12345", "LOW", 1.0).is_ok());
        assert!(VulnerabilityInfo::new("CVE-24-1234", "LOW", 1.0).is_err());
        assert!(VulnerabilityInfo::new("CVE-2024-123", "LOW", 1.0).is_err());
        assert!(VulnerabilityInfo::new("cve-2024-1234", "LOW", 1.0).is_err());
        assert!(VulnerabilityInfo::new("CVE-2024-1234", "LOW", 10.5).is_err());
    }

    #[test]
    fn test_severity_thresholds() {
        let high = package("openssl", &[7.0]);
        let critical = package("log4j", &[9.0]);

        assert!(high.has_high_severity_vulnerabilities());
        assert!(high.is_security_compliant());
        assert!(critical.has_critical_vulnerabilities());
        assert!(!critical.is_security_compliant());
    }

    #[test]
    fn test_system_packages_reject_duplicates_and_critical() {
        assert!(SystemPackages::new(vec![package("nginx", &[]), package("nginx", &[])]).is_err());
        assert!(SystemPackages::new(vec![package("log4j", &[9.8])]).is_err());
    }

    #[test]
    fn test_system_packages_add_and_remove_return_new_sets() {
        // Arrange
        let packages = SystemPackages::new(vec![package("nginx", &[5.0])]).unwrap();

        // Act
        let added = packages.add(package("redis", &[])).unwrap();
        let removed = added.remove("nginx").unwrap();

        // Assert
        assert_eq!(packages.len(), 1);
        assert_eq!(added.len(), 2);
        assert!(added.has_vulnerabilities());
        assert_eq!(added.vulnerable_packages().count(), 1);
        assert_eq!(removed.len(), 1);
        assert!(removed.get("redis").is_some());
        assert!(removed.remove("nginx").is_err());
        assert!(added.add(package("redis", &[])).is_err());
    }
}
