//! Event type → topic routing.

/// System Management lifecycle events.
pub const SYSTEM_EVENTS: &str = "system-events";
/// Vulnerability Management events.
pub const VULNERABILITY_EVENTS: &str = "vulnerability-events";
/// Task Management events.
pub const TASK_EVENTS: &str = "task-events";
/// Security alerts raised by any context.
pub const SECURITY_EVENTS: &str = "security-events";
/// Events that need immediate attention.
pub const URGENT_EVENTS: &str = "urgent-events";
/// Fallback for event types without a dedicated topic.
pub const DEFAULT_TOPIC: &str = "domain-events";

/// Every topic an event can be routed to, default included.
pub const ALL_TOPICS: [&str; 6] = [
    SYSTEM_EVENTS,
    VULNERABILITY_EVENTS,
    TASK_EVENTS,
    SECURITY_EVENTS,
    URGENT_EVENTS,
    DEFAULT_TOPIC,
];

/// Returns the topic for `event_type`. Unmapped types go to [`DEFAULT_TOPIC`].
#[must_use]
pub fn topic_for(event_type: &str) -> &'static str {
    match event_type {
        "SystemRegistered" | "SystemConfigurationUpdated" | "SystemDecommissioned" => {
            SYSTEM_EVENTS
        }
        "SystemSecurityAlert" => SECURITY_EVENTS,
        "VulnerabilityDetected"
        | "VulnerabilityScanCompleted"
        | "VulnerabilityResolved"
        | "VulnerabilityScanInitiated" => VULNERABILITY_EVENTS,
        "TaskCreated" | "TaskCompleted" => TASK_EVENTS,
        "HighPriorityTaskCreated" => URGENT_EVENTS,
        _ => DEFAULT_TOPIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_lifecycle_events_route_to_system_topic() {
        for event_type in [
            "SystemRegistered",
            "SystemConfigurationUpdated",
            "SystemDecommissioned",
        ] {
            assert_eq!(topic_for(event_type), SYSTEM_EVENTS, "{event_type}");
        }
    }

    #[test]
    fn test_security_alert_is_split_from_system_topic() {
        assert_eq!(topic_for("SystemSecurityAlert"), SECURITY_EVENTS);
    }

    #[test]
    fn test_high_priority_task_goes_to_urgent_topic() {
        assert_eq!(topic_for("TaskCreated"), TASK_EVENTS);
        assert_eq!(topic_for("TaskCompleted"), TASK_EVENTS);
        assert_eq!(topic_for("HighPriorityTaskCreated"), URGENT_EVENTS);
    }

    #[test]
    fn test_vulnerability_events_share_a_topic() {
        assert_eq!(topic_for("VulnerabilityScanInitiated"), VULNERABILITY_EVENTS);
        assert_eq!(topic_for("VulnerabilityResolved"), VULNERABILITY_EVENTS);
    }

    #[test]
    fn test_unmapped_and_near_miss_types_use_default() {
        assert_eq!(topic_for("SystemRenamed"), DEFAULT_TOPIC);
        assert_eq!(topic_for("systemregistered"), DEFAULT_TOPIC);
        assert_eq!(topic_for(""), DEFAULT_TOPIC);
    }

    #[test]
    fn test_every_routed_topic_is_listed() {
        for event_type in ["SystemRegistered", "SystemSecurityAlert", "TaskCreated", "Unknown"] {
            assert!(ALL_TOPICS.contains(&topic_for(event_type)));
        }
    }
}
