//! Graph Naming Configuration
//!
//! Relationship types and label suffixes used by composite creation. The
//! defaults reproduce the conventions below; deployments that already
//! store graphs under other names override them from the environment.
//!
//! | Setting              | Default        | Env override                  |
//! |----------------------|----------------|-------------------------------|
//! | latest event type    | `LATEST_EVENT` | `NODEGRAPH_LATEST_EVENT_TYPE` |
//! | next event type      | `NEXT`         | `NODEGRAPH_NEXT_EVENT_TYPE`   |
//! | role owner type      | `HAS_ROLE`     | `NODEGRAPH_ROLE_OWNER_TYPE`   |
//! | role target prefix   | `HAS_`         | `NODEGRAPH_ROLE_TARGET_PREFIX`|
//! | event link prefix    | `EVENT_`       | `NODEGRAPH_EVENT_LINK_PREFIX` |
//! | role label suffix    | `Role`         | `NODEGRAPH_ROLE_LABEL_SUFFIX` |
//! | event label suffix   | `Created`      | `NODEGRAPH_EVENT_LABEL_SUFFIX`|

use crate::models::{ensure_identifier, ValidationError};
use serde::{Deserialize, Serialize};
use std::env;

/// Naming conventions for role and event structures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphConfig {
    /// Owner -> newest event node
    pub latest_event_type: String,
    /// Newer event node -> older event node
    pub next_event_type: String,
    /// Role owner -> role node
    pub role_owner_type: String,
    /// Prefix of role -> target relationships (`HAS_SCHEDULE`)
    pub role_target_prefix: String,
    /// Prefix of event -> participant relationships (`EVENT_USER`, ...)
    pub event_link_prefix: String,
    /// Suffix of role node labels (`_ScheduleRole`)
    pub role_label_suffix: String,
    /// Suffix of event node labels (`_ScheduleCreated`)
    pub event_label_suffix: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            latest_event_type: "LATEST_EVENT".to_string(),
            next_event_type: "NEXT".to_string(),
            role_owner_type: "HAS_ROLE".to_string(),
            role_target_prefix: "HAS_".to_string(),
            event_link_prefix: "EVENT_".to_string(),
            role_label_suffix: "Role".to_string(),
            event_label_suffix: "Created".to_string(),
        }
    }
}

impl GraphConfig {
    /// Defaults overridden by any `NODEGRAPH_*` environment variables
    pub fn from_env() -> Result<Self, ValidationError> {
        let mut config = Self::default();
        let overrides = [
            ("NODEGRAPH_LATEST_EVENT_TYPE", &mut config.latest_event_type),
            ("NODEGRAPH_NEXT_EVENT_TYPE", &mut config.next_event_type),
            ("NODEGRAPH_ROLE_OWNER_TYPE", &mut config.role_owner_type),
            ("NODEGRAPH_ROLE_TARGET_PREFIX", &mut config.role_target_prefix),
            ("NODEGRAPH_EVENT_LINK_PREFIX", &mut config.event_link_prefix),
            ("NODEGRAPH_ROLE_LABEL_SUFFIX", &mut config.role_label_suffix),
            ("NODEGRAPH_EVENT_LABEL_SUFFIX", &mut config.event_label_suffix),
        ];
        for (key, slot) in overrides {
            if let Ok(value) = env::var(key) {
                *slot = value;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Every name must be usable as a label or relationship type
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_identifier("latestEventType", &self.latest_event_type)?;
        ensure_identifier("nextEventType", &self.next_event_type)?;
        ensure_identifier("roleOwnerType", &self.role_owner_type)?;
        ensure_identifier("roleTargetPrefix", &self.role_target_prefix)?;
        ensure_identifier("eventLinkPrefix", &self.event_link_prefix)?;
        ensure_identifier("roleLabelSuffix", &self.role_label_suffix)?;
        ensure_identifier("eventLabelSuffix", &self.event_label_suffix)
    }

    /// Label of role nodes attached to `label` (`Schedule` -> `_ScheduleRole`)
    pub fn role_label(&self, label: &str) -> String {
        format!("_{}{}", label, self.role_label_suffix)
    }

    /// Label of event nodes recording creation of a `label` entity
    /// (`Activity` -> `_ActivityCreated`, `_ScheduleRole` -> `_ScheduleRoleCreated`)
    pub fn event_label(&self, label: &str) -> String {
        format!("_{}{}", label.trim_start_matches('_'), self.event_label_suffix)
    }

    /// Relationship type from an event to a participant labeled `label`
    /// (`Schedule` -> `EVENT_SCHEDULE`)
    pub fn event_link_type(&self, label: &str) -> String {
        format!(
            "{}{}",
            self.event_link_prefix,
            label.trim_start_matches('_').to_uppercase()
        )
    }

    /// Relationship type from a role node to the entity it applies to
    /// (`Schedule` -> `HAS_SCHEDULE`)
    pub fn role_target_type(&self, label: &str) -> String {
        format!(
            "{}{}",
            self.role_target_prefix,
            label.trim_start_matches('_').to_uppercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.latest_event_type, "LATEST_EVENT");
        assert_eq!(config.next_event_type, "NEXT");
        assert_eq!(config.role_owner_type, "HAS_ROLE");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_names() {
        let config = GraphConfig::default();
        assert_eq!(config.role_label("Schedule"), "_ScheduleRole");
        assert_eq!(config.event_label("Activity"), "_ActivityCreated");
        assert_eq!(config.event_label("_ScheduleRole"), "_ScheduleRoleCreated");
        assert_eq!(config.event_link_type("Schedule"), "EVENT_SCHEDULE");
        assert_eq!(config.event_link_type("_ScheduleRole"), "EVENT_SCHEDULEROLE");
        assert_eq!(config.role_target_type("Schedule"), "HAS_SCHEDULE");
    }

    #[test]
    fn test_role_target_prefix_override() {
        let config: GraphConfig =
            serde_json::from_value(serde_json::json!({"roleTargetPrefix": "GRANTS_"})).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.role_target_type("Schedule"), "GRANTS_SCHEDULE");
        assert_eq!(config.role_owner_type, "HAS_ROLE");
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let config: GraphConfig =
            serde_json::from_value(serde_json::json!({"latestEventType": "LAST"})).unwrap();
        assert_eq!(config.latest_event_type, "LAST");
        assert_eq!(config.next_event_type, "NEXT");
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let config = GraphConfig {
            role_owner_type: "HAS ROLE".to_string(),
            ..GraphConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
