//! Relationship Builder
//!
//! Creates exactly one typed relationship per call. Both endpoints were
//! resolved or created earlier in the same operation, so a missing endpoint
//! is reported as an internal consistency error rather than a bad reference.

use crate::db::{GraphExecutor, GraphQuery, StoreError};
use crate::models::{Direction, Node, Relationship};
use crate::services::error::ModelServiceError;
use serde_json::{Map, Value};

pub struct RelationshipBuilder<'a> {
    executor: &'a dyn GraphExecutor,
}

impl<'a> RelationshipBuilder<'a> {
    pub fn new(executor: &'a dyn GraphExecutor) -> Self {
        Self { executor }
    }

    /// Relate a newly created entity to a reference entity
    ///
    /// `Direction::To` yields `created -> reference`, `Direction::From`
    /// yields `reference -> created`.
    pub async fn link(
        &self,
        created: &Node,
        reference: &Node,
        rel_type: &str,
        direction: Direction,
        properties: Map<String, Value>,
    ) -> Result<Relationship, ModelServiceError> {
        let (start, end) = match direction {
            Direction::To => (created, reference),
            Direction::From => (reference, created),
        };
        self.connect(start, end, rel_type, properties).await
    }

    /// Create `start -[rel_type]-> end`
    pub async fn connect(
        &self,
        start: &Node,
        end: &Node,
        rel_type: &str,
        properties: Map<String, Value>,
    ) -> Result<Relationship, ModelServiceError> {
        let result = self
            .executor
            .execute(GraphQuery::CreateRelationship {
                start: start.id.clone(),
                end: end.id.clone(),
                rel_type: rel_type.to_string(),
                properties,
            })
            .await
            .map_err(|e| match e {
                StoreError::NodeNotFound { id } => ModelServiceError::inconsistent(format!(
                    "endpoint {} disappeared before {} could be created",
                    id, rel_type
                )),
                other => other.into(),
            })?;

        tracing::debug!(
            "Created relationship ({})-[:{}]->({})",
            start.label,
            rel_type,
            end.label
        );

        result.into_first_relationship().ok_or_else(|| {
            ModelServiceError::inconsistent(format!("store returned no {} relationship", rel_type))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryGraph;

    async fn seed(graph: &MemoryGraph, label: &str) -> Node {
        let node = Node::new(label, Map::new());
        graph
            .execute(GraphQuery::CreateNode { node: node.clone() })
            .await
            .unwrap();
        node
    }

    #[tokio::test]
    async fn test_link_directions() {
        let graph = MemoryGraph::new();
        let activity = seed(&graph, "Activity").await;
        let schedule = seed(&graph, "Schedule").await;
        let builder = RelationshipBuilder::new(&graph);

        let to = builder
            .link(&activity, &schedule, "CONTAINS", Direction::To, Map::new())
            .await
            .unwrap();
        assert_eq!((to.start.as_str(), to.end.as_str()), (activity.id.as_str(), schedule.id.as_str()));

        let from = builder
            .link(&activity, &schedule, "OWNS", Direction::From, Map::new())
            .await
            .unwrap();
        assert_eq!(from.start, schedule.id);
        assert_eq!(from.end, activity.id);
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_inconsistent() {
        let graph = MemoryGraph::new();
        let activity = seed(&graph, "Activity").await;
        let ghost = Node::new("Schedule", Map::new());

        let err = RelationshipBuilder::new(&graph)
            .link(&activity, &ghost, "CONTAINS", Direction::To, Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelServiceError::Inconsistent(_)));
        assert_eq!(graph.stats().await.relationship_count, 0);
    }
}
