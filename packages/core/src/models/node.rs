//! Node and Relationship Data Structures
//!
//! This module defines the graph records handled by NodeGraph:
//!
//! - `Node` - an entity with a single label and a JSON property map
//! - `Relationship` - a directed, typed edge between two nodes
//!
//! # Identity
//!
//! Every node carries a UUID `id`. The same value is mirrored into the
//! `_id` property so that index lookups (`indexField = "_id"`) and direct
//! id lookups resolve the same entity.
//!
//! # Examples
//!
//! ```rust
//! use nodegraph_core::models::Node;
//! use serde_json::{json, Map};
//!
//! let mut properties = Map::new();
//! properties.insert("first".to_string(), json!("John"));
//!
//! let user = Node::new("User", properties);
//! assert_eq!(user.label, "User");
//! assert_eq!(user.get_str("_id"), Some(user.id.as_str()));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

/// Property holding the node identifier
pub const ID_FIELD: &str = "_id";

// Labels, relationship types and field names are embedded in query
// templates, so they are restricted to plain identifiers.
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Check whether a label, relationship type or field name is a plain identifier
///
/// # Examples
///
/// ```
/// # use nodegraph_core::models::is_valid_identifier;
/// assert!(is_valid_identifier("HAS_SCHEDULE"));
/// assert!(is_valid_identifier("_ScheduleRole"));
/// assert!(!is_valid_identifier("Bad Label"));
/// assert!(!is_valid_identifier("x}) DETACH DELETE n //"));
/// ```
pub fn is_valid_identifier(name: &str) -> bool {
    static IDENTIFIER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = IDENTIFIER_REGEX
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern compiles"));
    regex.is_match(name)
}

/// Validation errors raised before any store access
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required input is absent (e.g. `role.user`)
    #[error("{0} is required")]
    Required(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Model already registered: {0}")]
    DuplicateModel(String),

    /// Label, relationship type or field name is not a plain identifier
    #[error("Invalid identifier for {context}: {value:?}")]
    InvalidIdentifier { context: String, value: String },

    /// A property value could not be coerced to the declared field type
    #[error("Invalid value for field '{field}': expected {expected}, got {value}")]
    InvalidValue {
        field: String,
        expected: String,
        value: Value,
    },

    /// Options reference a participant role with no entity bound to it
    #[error("Role '{0}' is not bound in this operation")]
    UnboundRole(String),
}

impl ValidationError {
    /// Create a missing required input error
    pub fn required(path: impl Into<String>) -> Self {
        Self::Required(path.into())
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(context: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            context: context.into(),
            value: value.into(),
        }
    }
}

/// Ensure `value` is a plain identifier, reporting `context` otherwise
pub fn ensure_identifier(context: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::required(context));
    }
    if !is_valid_identifier(value) {
        return Err(ValidationError::invalid_identifier(context, value));
    }
    Ok(())
}

/// A graph entity: one label plus a property map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier, mirrored in the `_id` property
    pub id: String,

    /// Node label (model label, role label or event label)
    pub label: String,

    /// All entity fields
    pub properties: Map<String, Value>,
}

impl Node {
    /// Create a node with a freshly generated UUID
    pub fn new(label: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), label, properties)
    }

    /// Create a node with an explicit identifier
    pub fn with_id(
        id: impl Into<String>,
        label: impl Into<String>,
        mut properties: Map<String, Value>,
    ) -> Self {
        let id = id.into();
        properties.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        Self {
            id,
            label: label.into(),
            properties,
        }
    }

    /// Get a property value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.properties.get(field)
    }

    /// Get a string property
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.properties.get(field).and_then(Value::as_str)
    }

    /// Get an integer property
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.properties.get(field).and_then(Value::as_i64)
    }
}

/// A directed, typed edge between two nodes
///
/// Type and direction are fixed at creation and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,

    /// Relationship type (e.g. "MEMBER", "HAS_SCHEDULE", "LATEST_EVENT")
    #[serde(rename = "type")]
    pub rel_type: String,

    /// Id of the start node
    pub start: String,

    /// Id of the end node
    pub end: String,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Relationship {
    pub fn new(
        rel_type: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        properties: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rel_type: rel_type.into(),
            start: start.into(),
            end: end.into(),
            properties,
        }
    }
}
