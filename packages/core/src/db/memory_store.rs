//! In-Memory Graph Store
//!
//! `MemoryGraph` is a complete `GraphExecutor` backed by insertion-ordered
//! maps behind a single `tokio::sync::RwLock`:
//!
//! - Reads (`GetNode`, `FindNodes`, `MatchRelated`) share the read lock
//! - Every mutation holds the write lock for the whole statement, which
//!   makes each statement atomic; concurrent `IncrementProperty` calls on
//!   one field serialize and never lose updates
//! - Results come back in insertion order, so "first match wins" lookups
//!   are deterministic
//!
//! Mutations are announced as [`DomainEvent`]s once the lock is released.

use crate::db::error::StoreError;
use crate::db::events::DomainEvent;
use crate::db::graph_executor::GraphExecutor;
use crate::db::query::{GraphQuery, MatchDirection, QueryResult};
use crate::models::{Node, Relationship, ID_FIELD};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use tokio::sync::{broadcast, RwLock};

/// Broadcast channel capacity for domain events.
///
/// Composite creations emit a handful of events each; slow observers that
/// lag behind lose the oldest events, never the graph state.
const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, Default)]
struct GraphState {
    nodes: IndexMap<String, Node>,
    relationships: IndexMap<String, Relationship>,
}

impl GraphState {
    fn ensure_node(&self, id: &str) -> Result<(), StoreError> {
        if self.nodes.contains_key(id) {
            Ok(())
        } else {
            Err(StoreError::node_not_found(id))
        }
    }

    fn insert_relationship(&mut self, relationship: Relationship) -> Relationship {
        self.relationships
            .insert(relationship.id.clone(), relationship.clone());
        relationship
    }
}

/// Record counts, for tests and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub node_count: usize,
    pub relationship_count: usize,
}

/// In-process graph store
pub struct MemoryGraph {
    state: RwLock<GraphState>,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(GraphState::default()),
            event_tx,
        }
    }

    /// Subscribe to mutations applied after this call
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    /// Current record counts
    pub async fn stats(&self) -> GraphStats {
        let state = self.state.read().await;
        GraphStats {
            node_count: state.nodes.len(),
            relationship_count: state.relationships.len(),
        }
    }

    /// Number of relationships of one type
    pub async fn count_relationships(&self, rel_type: &str) -> usize {
        let state = self.state.read().await;
        state
            .relationships
            .values()
            .filter(|r| r.rel_type == rel_type)
            .count()
    }

    fn emit(&self, events: Vec<DomainEvent>) {
        for event in events {
            // No subscribers is not an error
            let _ = self.event_tx.send(event);
        }
    }

    async fn apply(&self, query: GraphQuery) -> Result<(QueryResult, Vec<DomainEvent>), StoreError> {
        match query {
            GraphQuery::CreateNode { node } => {
                let mut state = self.state.write().await;
                if state.nodes.contains_key(&node.id) {
                    return Err(StoreError::DuplicateId { id: node.id });
                }
                state.nodes.insert(node.id.clone(), node.clone());
                Ok((
                    QueryResult::from_node(node.clone()),
                    vec![DomainEvent::NodeCreated(node)],
                ))
            }

            GraphQuery::GetNode { id } => {
                let state = self.state.read().await;
                let nodes = state.nodes.get(&id).cloned().into_iter().collect();
                Ok((
                    QueryResult {
                        nodes,
                        ..QueryResult::default()
                    },
                    Vec::new(),
                ))
            }

            GraphQuery::FindNodes {
                label,
                field,
                value,
                limit,
            } => {
                let state = self.state.read().await;
                let matches = state
                    .nodes
                    .values()
                    .filter(|n| n.label == label && n.properties.get(&field) == Some(&value))
                    .take(limit.unwrap_or(usize::MAX))
                    .cloned()
                    .collect();
                Ok((
                    QueryResult {
                        nodes: matches,
                        ..QueryResult::default()
                    },
                    Vec::new(),
                ))
            }

            GraphQuery::CreateRelationship {
                start,
                end,
                rel_type,
                properties,
            } => {
                let mut state = self.state.write().await;
                state.ensure_node(&start)?;
                state.ensure_node(&end)?;
                let relationship =
                    state.insert_relationship(Relationship::new(rel_type, start, end, properties));
                Ok((
                    QueryResult::from_relationships(vec![relationship.clone()]),
                    vec![DomainEvent::RelationshipCreated(relationship)],
                ))
            }

            GraphQuery::AdvanceLatestEvent {
                owner,
                event,
                latest_type,
                next_type,
            } => {
                let mut state = self.state.write().await;
                state.ensure_node(&owner)?;
                state.ensure_node(&event)?;

                let mut events = Vec::new();
                let previous = state
                    .relationships
                    .values()
                    .find(|r| r.start == owner && r.rel_type == latest_type)
                    .map(|r| (r.id.clone(), r.end.clone()));

                let previous_event = match previous {
                    Some((rel_id, previous_event)) => {
                        state.relationships.shift_remove(&rel_id);
                        events.push(DomainEvent::RelationshipDeleted { id: rel_id });
                        Some(previous_event)
                    }
                    None => None,
                };

                let latest = state.insert_relationship(Relationship::new(
                    latest_type,
                    owner,
                    event.clone(),
                    Map::new(),
                ));
                events.push(DomainEvent::RelationshipCreated(latest.clone()));
                let mut created = vec![latest];

                if let Some(previous_event) = previous_event {
                    let next = state.insert_relationship(Relationship::new(
                        next_type,
                        event,
                        previous_event,
                        Map::new(),
                    ));
                    events.push(DomainEvent::RelationshipCreated(next.clone()));
                    created.push(next);
                }

                Ok((QueryResult::from_relationships(created), events))
            }

            GraphQuery::IncrementProperty { id, field, by } => {
                let mut state = self.state.write().await;
                let node = state
                    .nodes
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::node_not_found(id.clone()))?;

                let not_numeric = || StoreError::NotNumeric {
                    id: id.clone(),
                    field: field.clone(),
                };
                let updated = match node.properties.get(&field) {
                    None | Some(Value::Null) => Value::from(by),
                    Some(Value::Number(n)) => {
                        if let Some(current) = n.as_i64() {
                            Value::from(current.checked_add(by).ok_or_else(not_numeric)?)
                        } else {
                            let current = n.as_f64().ok_or_else(not_numeric)?;
                            Number::from_f64(current + by as f64)
                                .map(Value::Number)
                                .ok_or_else(not_numeric)?
                        }
                    }
                    Some(_) => return Err(not_numeric()),
                };

                node.properties.insert(field, updated.clone());
                let snapshot = node.clone();
                Ok((
                    QueryResult::from_value(updated),
                    vec![DomainEvent::NodeUpdated(snapshot)],
                ))
            }

            GraphQuery::SetProperties { id, properties } => {
                let mut state = self.state.write().await;
                let node = state
                    .nodes
                    .get_mut(&id)
                    .ok_or_else(|| StoreError::node_not_found(id.clone()))?;
                for (key, value) in properties {
                    if key != ID_FIELD {
                        node.properties.insert(key, value);
                    }
                }
                let snapshot = node.clone();
                Ok((
                    QueryResult::from_node(snapshot.clone()),
                    vec![DomainEvent::NodeUpdated(snapshot)],
                ))
            }

            GraphQuery::MatchRelated {
                id,
                rel_type,
                direction,
                label,
            } => {
                let state = self.state.read().await;
                let mut result = QueryResult::default();
                for relationship in state.relationships.values() {
                    if relationship.rel_type != rel_type {
                        continue;
                    }
                    let other_id = match direction {
                        MatchDirection::Outgoing if relationship.start == id => &relationship.end,
                        MatchDirection::Incoming if relationship.end == id => &relationship.start,
                        _ => continue,
                    };
                    let Some(other) = state.nodes.get(other_id) else {
                        continue;
                    };
                    if label.as_ref().is_some_and(|l| *l != other.label) {
                        continue;
                    }
                    result.relationships.push(relationship.clone());
                    result.nodes.push(other.clone());
                }
                Ok((result, Vec::new()))
            }
        }
    }
}

#[async_trait]
impl GraphExecutor for MemoryGraph {
    async fn execute(&self, query: GraphQuery) -> Result<QueryResult, StoreError> {
        query.validate()?;
        if query.is_mutation() {
            tracing::debug!(
                statement = query.kind(),
                template = %query.to_cypher().template,
                "MemoryGraph applying mutation"
            );
        } else {
            tracing::trace!(statement = query.kind(), "MemoryGraph reading");
        }

        let (result, events) = self.apply(query).await?;
        self.emit(events);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(label: &str, properties: Value) -> Node {
        Node::new(label, properties.as_object().cloned().unwrap_or_default())
    }

    async fn create(graph: &MemoryGraph, node: Node) -> Node {
        graph
            .execute(GraphQuery::CreateNode { node })
            .await
            .unwrap()
            .into_first_node()
            .unwrap()
    }

    async fn relate(graph: &MemoryGraph, start: &str, end: &str, rel_type: &str) {
        graph
            .execute(GraphQuery::CreateRelationship {
                start: start.to_string(),
                end: end.to_string(),
                rel_type: rel_type.to_string(),
                properties: Map::new(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_find_by_index() {
        let graph = MemoryGraph::new();
        let john = create(&graph, node("User", json!({"first": "John"}))).await;
        create(&graph, node("User", json!({"first": "Jane"}))).await;

        let found = graph
            .execute(GraphQuery::FindNodes {
                label: "User".to_string(),
                field: "first".to_string(),
                value: json!("John"),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(found.nodes, vec![john.clone()]);

        let by_id = graph
            .execute(GraphQuery::GetNode { id: john.id.clone() })
            .await
            .unwrap()
            .into_first_node();
        assert_eq!(by_id, Some(john));
    }

    #[tokio::test]
    async fn test_find_respects_label_and_limit() {
        let graph = MemoryGraph::new();
        for _ in 0..3 {
            create(&graph, node("Schedule", json!({"scheduleName": "S"}))).await;
        }
        create(&graph, node("Activity", json!({"scheduleName": "S"}))).await;

        let found = graph
            .execute(GraphQuery::FindNodes {
                label: "Schedule".to_string(),
                field: "scheduleName".to_string(),
                value: json!("S"),
                limit: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(found.nodes.len(), 2);
        assert!(found.nodes.iter().all(|n| n.label == "Schedule"));
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let graph = MemoryGraph::new();
        let user = create(&graph, node("User", json!({}))).await;
        let err = graph
            .execute(GraphQuery::CreateNode { node: user.clone() })
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateId { id: user.id });
    }

    #[tokio::test]
    async fn test_relationship_requires_both_endpoints() {
        let graph = MemoryGraph::new();
        let user = create(&graph, node("User", json!({}))).await;
        let err = graph
            .execute(GraphQuery::CreateRelationship {
                start: user.id.clone(),
                end: "missing".to_string(),
                rel_type: "MEMBER".to_string(),
                properties: Map::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::node_not_found("missing"));
        assert_eq!(graph.stats().await.relationship_count, 0);
    }

    #[tokio::test]
    async fn test_match_related_both_directions_with_label_filter() {
        let graph = MemoryGraph::new();
        let schedule = create(&graph, node("Schedule", json!({}))).await;
        let role = create(&graph, node("_ScheduleRole", json!({"role": "Admin"}))).await;
        let other = create(&graph, node("Activity", json!({}))).await;
        relate(&graph, &role.id, &schedule.id, "HAS_SCHEDULE").await;
        relate(&graph, &other.id, &schedule.id, "HAS_SCHEDULE").await;

        let incoming = graph
            .execute(GraphQuery::MatchRelated {
                id: schedule.id.clone(),
                rel_type: "HAS_SCHEDULE".to_string(),
                direction: MatchDirection::Incoming,
                label: Some("_ScheduleRole".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(incoming.nodes, vec![role.clone()]);
        assert_eq!(incoming.relationships.len(), 1);

        let outgoing = graph
            .execute(GraphQuery::MatchRelated {
                id: role.id.clone(),
                rel_type: "HAS_SCHEDULE".to_string(),
                direction: MatchDirection::Outgoing,
                label: None,
            })
            .await
            .unwrap();
        assert_eq!(outgoing.nodes, vec![schedule]);
    }

    #[tokio::test]
    async fn test_advance_latest_event_chains_previous() {
        let graph = MemoryGraph::new();
        let owner = create(&graph, node("User", json!({}))).await;
        let first = create(&graph, node("_ScheduleCreated", json!({}))).await;
        let second = create(&graph, node("_ActivityCreated", json!({}))).await;

        let advance = |event: &Node| GraphQuery::AdvanceLatestEvent {
            owner: owner.id.clone(),
            event: event.id.clone(),
            latest_type: "LATEST_EVENT".to_string(),
            next_type: "NEXT".to_string(),
        };

        let result = graph.execute(advance(&first)).await.unwrap();
        assert_eq!(result.relationships.len(), 1);

        let result = graph.execute(advance(&second)).await.unwrap();
        assert_eq!(result.relationships.len(), 2);
        assert_eq!(result.relationships[1].start, second.id);
        assert_eq!(result.relationships[1].end, first.id);

        assert_eq!(graph.count_relationships("LATEST_EVENT").await, 1);
        assert_eq!(graph.count_relationships("NEXT").await, 1);

        let latest = graph
            .execute(GraphQuery::MatchRelated {
                id: owner.id.clone(),
                rel_type: "LATEST_EVENT".to_string(),
                direction: MatchDirection::Outgoing,
                label: None,
            })
            .await
            .unwrap();
        assert_eq!(latest.nodes, vec![second]);
    }

    #[tokio::test]
    async fn test_increment_initializes_and_adds() {
        let graph = MemoryGraph::new();
        let user = create(&graph, node("User", json!({"countSchedules": 1}))).await;

        let increment = |field: &str| GraphQuery::IncrementProperty {
            id: user.id.clone(),
            field: field.to_string(),
            by: 1,
        };

        let value = graph.execute(increment("countSchedules")).await.unwrap().value;
        assert_eq!(value, Some(json!(2)));

        let value = graph.execute(increment("countActivities")).await.unwrap().value;
        assert_eq!(value, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_increment_rejects_non_numeric() {
        let graph = MemoryGraph::new();
        let user = create(&graph, node("User", json!({"first": "John"}))).await;
        let err = graph
            .execute(GraphQuery::IncrementProperty {
                id: user.id.clone(),
                field: "first".to_string(),
                by: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotNumeric { .. }));
    }

    #[tokio::test]
    async fn test_set_properties_keeps_id() {
        let graph = MemoryGraph::new();
        let user = create(&graph, node("User", json!({"first": "John"}))).await;
        let updated = graph
            .execute(GraphQuery::SetProperties {
                id: user.id.clone(),
                properties: json!({"first": "Johnny", "_id": "other"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            })
            .await
            .unwrap()
            .into_first_node()
            .unwrap();
        assert_eq!(updated.get_str("first"), Some("Johnny"));
        assert_eq!(updated.get_str(ID_FIELD), Some(user.id.as_str()));
    }

    #[tokio::test]
    async fn test_mutations_emit_events_reads_do_not() {
        let graph = MemoryGraph::new();
        let mut rx = graph.subscribe_to_events();

        let user = create(&graph, node("User", json!({}))).await;
        match rx.try_recv().unwrap() {
            DomainEvent::NodeCreated(created) => assert_eq!(created.id, user.id),
            other => panic!("Expected NodeCreated event, got {:?}", other),
        }

        graph
            .execute(GraphQuery::GetNode { id: user.id.clone() })
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_statement_rejected_before_apply() {
        let graph = MemoryGraph::new();
        let err = graph
            .execute(GraphQuery::FindNodes {
                label: "User) DETACH DELETE (n".to_string(),
                field: "_id".to_string(),
                value: json!("x"),
                limit: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MalformedQuery(_)));
    }
}
