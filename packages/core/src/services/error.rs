//! Service Layer Error Types
//!
//! Every component of a composite creation reports failures through
//! `ModelServiceError`. The orchestrator returns the first error it meets
//! unchanged; no later step runs.

use crate::db::StoreError;
use crate::models::ValidationError;
use serde_json::Value;
use thiserror::Error;

/// Model service operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelServiceError {
    /// Input or options rejected before any store access
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A reference lookup matched no entity
    #[error("Reference not found: {label} with {field} = {value}")]
    NotFound {
        label: String,
        field: String,
        value: Value,
    },

    /// The graph store reported a failure
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// An entity resolved earlier in the operation vanished
    #[error("Internal consistency error: {0}")]
    Inconsistent(String),
}

impl ModelServiceError {
    /// Create a reference not found error
    pub fn not_found(label: impl Into<String>, field: impl Into<String>, value: Value) -> Self {
        Self::NotFound {
            label: label.into(),
            field: field.into(),
            value,
        }
    }

    /// Create an internal consistency error
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
