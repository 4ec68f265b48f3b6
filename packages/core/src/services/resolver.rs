//! Reference Resolver
//!
//! Locates existing entities named by a composite creation: the acting
//! entity behind a reference id, and the relationship target named by
//! `(label, field, value)`.
//!
//! Lookups never create anything. A lookup matching more than one entity
//! is ambiguous; the first match in store order wins and a warning is
//! logged.

use crate::db::{GraphExecutor, GraphQuery};
use crate::models::{ensure_identifier, Node, ID_FIELD};
use crate::services::error::ModelServiceError;
use serde_json::Value;

/// Label reported for id lookups that accept any label
const ANY_LABEL: &str = "node";

pub struct ReferenceResolver<'a> {
    executor: &'a dyn GraphExecutor,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(executor: &'a dyn GraphExecutor) -> Self {
        Self { executor }
    }

    /// Find the entity of `label` whose `field` equals `value`
    pub async fn resolve(
        &self,
        label: &str,
        field: &str,
        value: &Value,
    ) -> Result<Node, ModelServiceError> {
        ensure_identifier("label", label)?;
        ensure_identifier("field", field)?;

        let result = self
            .executor
            .execute(GraphQuery::FindNodes {
                label: label.to_string(),
                field: field.to_string(),
                value: value.clone(),
                limit: Some(2),
            })
            .await?;

        if result.nodes.len() > 1 {
            tracing::warn!(
                "Ambiguous reference {}.{} = {}: using first match",
                label,
                field,
                value
            );
        }

        result
            .into_first_node()
            .ok_or_else(|| ModelServiceError::not_found(label, field, value.clone()))
    }

    /// Find any entity by id, whatever its label
    pub async fn resolve_id(&self, id: &str) -> Result<Node, ModelServiceError> {
        self.executor
            .execute(GraphQuery::GetNode { id: id.to_string() })
            .await?
            .into_first_node()
            .ok_or_else(|| {
                ModelServiceError::not_found(ANY_LABEL, ID_FIELD, Value::String(id.to_string()))
            })
    }

    /// Find an entity of `label` by id
    pub async fn resolve_labeled_id(&self, label: &str, id: &str) -> Result<Node, ModelServiceError> {
        self.resolve(label, ID_FIELD, &Value::String(id.to_string()))
            .await
    }
}
