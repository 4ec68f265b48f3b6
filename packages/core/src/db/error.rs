//! Store Error Types
//!
//! Errors reported by a `GraphExecutor` while running a statement:
//! missing endpoints, constraint violations, malformed statements and
//! backend failures (connectivity and the like).

use thiserror::Error;

/// Graph store operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Statement referenced a node id that does not exist
    #[error("Node not found in store: {id}")]
    NodeNotFound { id: String },

    /// Unique `_id` constraint violated
    #[error("Node with id {id} already exists")]
    DuplicateId { id: String },

    /// Increment targeted a property holding a non-numeric value
    #[error("Property '{field}' on node {id} is not numeric")]
    NotNumeric { id: String, field: String },

    /// Statement failed validation (e.g. a non-identifier label)
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// Backend failure (connectivity, protocol, ...)
    #[error("Store backend failed: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a malformed query error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedQuery(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
