//! Counter Updater
//!
//! Increments numeric properties on participants named by role. Each
//! increment is a single `IncrementProperty` statement, so concurrent
//! creations never lose updates. An absent counter starts from zero.

use crate::db::{GraphExecutor, GraphQuery, StoreError};
use crate::models::{CounterSpec, ParticipantRole};
use crate::services::context::OperationContext;
use crate::services::error::ModelServiceError;
use serde::Serialize;
use serde_json::Value;

/// The value a counter holds after its increment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterUpdate {
    pub role: ParticipantRole,
    pub node_id: String,
    pub field: String,
    pub value: Value,
}

pub struct CounterUpdater<'a> {
    executor: &'a dyn GraphExecutor,
}

impl<'a> CounterUpdater<'a> {
    pub fn new(executor: &'a dyn GraphExecutor) -> Self {
        Self { executor }
    }

    /// Apply `counters` in order, one increment each
    pub async fn increment(
        &self,
        context: &OperationContext,
        counters: &[CounterSpec],
    ) -> Result<Vec<CounterUpdate>, ModelServiceError> {
        let mut updates = Vec::with_capacity(counters.len());

        for counter in counters {
            let target = context.require(counter.node)?;
            let result = self
                .executor
                .execute(GraphQuery::IncrementProperty {
                    id: target.id.clone(),
                    field: counter.field.clone(),
                    by: 1,
                })
                .await
                .map_err(|e| match e {
                    StoreError::NodeNotFound { id } => ModelServiceError::inconsistent(format!(
                        "counter target {} disappeared before {} was incremented",
                        id, counter.field
                    )),
                    other => other.into(),
                })?;

            let value = result.value.unwrap_or(Value::Null);
            tracing::debug!(
                "Incremented {}.{} on {} to {}",
                target.label,
                counter.field,
                counter.node,
                value
            );

            updates.push(CounterUpdate {
                role: counter.node,
                node_id: target.id.clone(),
                field: counter.field.clone(),
                value,
            });
        }

        Ok(updates)
    }
}
