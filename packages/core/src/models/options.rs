//! Composite Creation Options
//!
//! Per-call configuration for `create_with_relationship` and `create_role`.
//! The recognized keys are exactly `relationship`, `eventNodes`, `counters`
//! and `role`; the structures deserialize from the camelCase JSON shape:
//!
//! ```json
//! {
//!   "relationship": {
//!     "nodeLabel": "Schedule",
//!     "indexField": "_id",
//!     "indexValue": "3f1c...",
//!     "type": "CONTAINS",
//!     "direction": "to"
//!   },
//!   "eventNodes": { "relationshipNode": true, "user": true },
//!   "counters": [{ "node": "relationshipNode", "field": "activityCount" }]
//! }
//! ```
//!
//! Options are not persisted; the orchestrator owns them for one call.

use crate::models::node::{ensure_identifier, ValidationError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Name under which an entity is bound during one composite creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantRole {
    /// The entity being created
    Node,
    /// The acting entity identified by the reference id
    User,
    /// The existing entity the base relationship connects to
    #[serde(alias = "other")]
    RelationshipNode,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Node => "node",
            ParticipantRole::User => "user",
            ParticipantRole::RelationshipNode => "relationshipNode",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the base relationship relative to the new entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// new entity -> reference entity
    To,
    /// reference entity -> new entity
    From,
}

/// Locates the existing entity to relate to, and how to relate to it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationshipSpec {
    pub node_label: String,
    pub index_field: String,
    pub index_value: Value,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub direction: Option<Direction>,
}

impl RelationshipSpec {
    pub fn new(
        node_label: impl Into<String>,
        index_field: impl Into<String>,
        index_value: impl Into<Value>,
        rel_type: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            node_label: node_label.into(),
            index_field: index_field.into(),
            index_value: index_value.into(),
            rel_type: rel_type.into(),
            direction: Some(direction),
        }
    }

    /// Check every sub-field is present and usable in a query template
    pub fn validate(&self) -> Result<Direction, ValidationError> {
        ensure_identifier("relationship.nodeLabel", &self.node_label)?;
        ensure_identifier("relationship.indexField", &self.index_field)?;
        if self.index_value.is_null() {
            return Err(ValidationError::required("relationship.indexValue"));
        }
        ensure_identifier("relationship.type", &self.rel_type)?;
        self.direction
            .ok_or_else(|| ValidationError::required("relationship.direction"))
    }
}

/// Which participants receive audit event nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventNodes {
    /// `true`: every bound participant except the new entity; `false`: none
    Enabled(bool),
    /// Explicit per-role flags, applied in insertion order
    Roles(IndexMap<ParticipantRole, bool>),
}

impl Default for EventNodes {
    fn default() -> Self {
        EventNodes::Enabled(true)
    }
}

impl EventNodes {
    /// Build an explicit role mapping from flagged roles
    pub fn roles(roles: impl IntoIterator<Item = ParticipantRole>) -> Self {
        EventNodes::Roles(roles.into_iter().map(|role| (role, true)).collect())
    }

    pub fn is_disabled(&self) -> bool {
        match self {
            EventNodes::Enabled(enabled) => !enabled,
            EventNodes::Roles(roles) => !roles.values().any(|flag| *flag),
        }
    }
}

/// Increment `field` by one on the entity bound to `node`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSpec {
    pub node: ParticipantRole,
    pub field: String,
}

impl CounterSpec {
    pub fn new(node: ParticipantRole, field: impl Into<String>) -> Self {
        Self {
            node,
            field: field.into(),
        }
    }
}

/// Attach a named role node owned by `role_owner` to the new entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleOption {
    pub role_owner: ParticipantRole,
    /// Checked at call time; an absent name is reported as `role.name`
    #[serde(default)]
    pub name: String,
}

/// Options for one composite creation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOptions {
    pub relationship: Option<RelationshipSpec>,
    pub event_nodes: EventNodes,
    pub counters: Vec<CounterSpec>,
    pub role: Option<RoleOption>,
}

impl CreateOptions {
    /// No relationship, default event nodes, no counters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relationship(mut self, relationship: RelationshipSpec) -> Self {
        self.relationship = Some(relationship);
        self
    }

    pub fn event_nodes(mut self, event_nodes: EventNodes) -> Self {
        self.event_nodes = event_nodes;
        self
    }

    pub fn without_event_nodes(self) -> Self {
        self.event_nodes(EventNodes::Enabled(false))
    }

    pub fn counter(mut self, node: ParticipantRole, field: impl Into<String>) -> Self {
        self.counters.push(CounterSpec::new(node, field));
        self
    }

    pub fn role(mut self, role_owner: ParticipantRole, name: impl Into<String>) -> Self {
        self.role = Some(RoleOption {
            role_owner,
            name: name.into(),
        });
        self
    }
}

/// Input of a role creation: every field is checked at call time
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleSpec {
    /// Role name stored on the role node
    pub name: Option<String>,
    /// Id of the user taking the role
    pub user: Option<String>,
    /// Id of the entity the role applies to
    pub other: Option<String>,
}

impl RoleSpec {
    pub fn new(
        name: impl Into<String>,
        user: impl Into<String>,
        other: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            user: Some(user.into()),
            other: Some(other.into()),
        }
    }
}
