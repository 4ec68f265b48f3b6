//! Event Emitter
//!
//! Records a composite creation as audit event nodes. Each participant
//! selected by the `eventNodes` option gets its own event node, which:
//!
//! 1. is labeled after the created entity (`Schedule` -> `_ScheduleCreated`)
//! 2. becomes the participant's `LATEST_EVENT`; the event it displaces is
//!    chained behind it with `NEXT`
//! 3. links to the participant (`EVENT_<PARTICIPANT LABEL>`) and to the
//!    created entity (`EVENT_<ENTITY LABEL>`)
//!
//! ```text
//! (user)-[:LATEST_EVENT]->(e2:_ActivityCreated)-[:NEXT]->(e1:_ScheduleCreated)
//! (e2)-[:EVENT_USER]->(user)
//! (e2)-[:EVENT_ACTIVITY]->(activity)
//! ```
//!
//! Selection rules:
//!
//! - `eventNodes: false` - no events
//! - `eventNodes: true` - `relationshipNode` then `user`, when bound
//! - `eventNodes: {role: bool}` - flagged roles in insertion order
//!
//! A participant bound under two roles receives a single event.

use crate::config::GraphConfig;
use crate::db::{GraphExecutor, GraphQuery, StoreError};
use crate::models::{EventNodes, Node, ParticipantRole, TimeProvider};
use crate::services::context::OperationContext;
use crate::services::error::ModelServiceError;
use crate::services::relationship_builder::RelationshipBuilder;
use serde::Serialize;
use serde_json::{Map, Value};

/// An event node together with the participant it was recorded for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNode {
    pub node: Node,
    pub role: ParticipantRole,
    pub owner_id: String,
}

/// Roles eligible for events when `eventNodes` is `true`, in emission order
const DEFAULT_EVENT_ROLES: [ParticipantRole; 2] =
    [ParticipantRole::RelationshipNode, ParticipantRole::User];

/// Resolve the `eventNodes` option against the bound participants
pub fn select_event_roles(
    event_nodes: &EventNodes,
    context: &OperationContext,
) -> Vec<ParticipantRole> {
    let candidates: Vec<ParticipantRole> = match event_nodes {
        EventNodes::Enabled(false) => Vec::new(),
        EventNodes::Enabled(true) => DEFAULT_EVENT_ROLES
            .into_iter()
            .filter(|role| context.is_bound(*role))
            .collect(),
        EventNodes::Roles(flags) => flags
            .iter()
            .filter(|(_, flag)| **flag)
            .map(|(role, _)| *role)
            .collect(),
    };

    let mut seen: Vec<&str> = Vec::new();
    let mut selected = Vec::new();
    for role in candidates {
        let Some(node) = context.get(role) else {
            // Unbound roles are rejected during option validation
            selected.push(role);
            continue;
        };
        if !seen.contains(&node.id.as_str()) {
            seen.push(node.id.as_str());
            selected.push(role);
        }
    }
    selected
}

pub struct EventEmitter<'a> {
    executor: &'a dyn GraphExecutor,
    config: &'a GraphConfig,
    clock: &'a dyn TimeProvider,
}

impl<'a> EventEmitter<'a> {
    pub fn new(
        executor: &'a dyn GraphExecutor,
        config: &'a GraphConfig,
        clock: &'a dyn TimeProvider,
    ) -> Self {
        Self {
            executor,
            config,
            clock,
        }
    }

    /// Emit one event per role, recording creation of the entity bound to
    /// `ParticipantRole::Node`
    pub async fn emit(
        &self,
        context: &OperationContext,
        roles: &[ParticipantRole],
    ) -> Result<Vec<EventNode>, ModelServiceError> {
        let subject = context.require(ParticipantRole::Node)?;
        let mut emitted = Vec::with_capacity(roles.len());

        for role in roles {
            let owner = context.require(*role)?;
            let event = self.emit_one(subject, *role, owner).await?;
            emitted.push(event);
        }

        Ok(emitted)
    }

    async fn emit_one(
        &self,
        subject: &Node,
        role: ParticipantRole,
        owner: &Node,
    ) -> Result<EventNode, ModelServiceError> {
        let label = self.config.event_label(&subject.label);

        let mut properties = Map::new();
        properties.insert(
            "eventType".to_string(),
            Value::String(label.trim_start_matches('_').to_string()),
        );
        properties.insert("role".to_string(), Value::String(role.to_string()));
        properties.insert("subject".to_string(), Value::String(subject.id.clone()));
        properties.insert(
            "createdAt".to_string(),
            Value::String(self.clock.now().to_rfc3339()),
        );

        let event = self
            .executor
            .execute(GraphQuery::CreateNode {
                node: Node::new(label, properties),
            })
            .await?
            .into_first_node()
            .ok_or_else(|| ModelServiceError::inconsistent("store returned no event node"))?;

        self.executor
            .execute(GraphQuery::AdvanceLatestEvent {
                owner: owner.id.clone(),
                event: event.id.clone(),
                latest_type: self.config.latest_event_type.clone(),
                next_type: self.config.next_event_type.clone(),
            })
            .await
            .map_err(|e| match e {
                StoreError::NodeNotFound { id } => ModelServiceError::inconsistent(format!(
                    "event owner {} disappeared before its latest event moved",
                    id
                )),
                other => other.into(),
            })?;

        let builder = RelationshipBuilder::new(self.executor);
        builder
            .connect(
                &event,
                owner,
                &self.config.event_link_type(&owner.label),
                Map::new(),
            )
            .await?;
        if owner.id != subject.id {
            builder
                .connect(
                    &event,
                    subject,
                    &self.config.event_link_type(&subject.label),
                    Map::new(),
                )
                .await?;
        }

        tracing::debug!(
            "Recorded {} for {} {} ({})",
            event.label,
            role,
            owner.label,
            owner.id
        );

        Ok(EventNode {
            node: event,
            role,
            owner_id: owner.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MatchDirection, MemoryGraph};
    use crate::models::FixedTimeProvider;
    use chrono::{TimeZone, Utc};

    async fn seed(graph: &MemoryGraph, label: &str) -> Node {
        let node = Node::new(label, Map::new());
        graph
            .execute(GraphQuery::CreateNode { node: node.clone() })
            .await
            .unwrap();
        node
    }

    fn clock() -> FixedTimeProvider {
        FixedTimeProvider::new(Utc.with_ymd_and_hms(2025, 1, 3, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_default_selection_dedupes_shared_entity() {
        let user = Node::new("User", Map::new());
        let mut context = OperationContext::new();
        context.bind(ParticipantRole::User, user.clone());
        context.bind(ParticipantRole::RelationshipNode, user);
        context.bind(ParticipantRole::Node, Node::new("Schedule", Map::new()));

        let roles = select_event_roles(&EventNodes::Enabled(true), &context);
        assert_eq!(roles, vec![ParticipantRole::RelationshipNode]);
    }

    #[test]
    fn test_selection_modes() {
        let mut context = OperationContext::new();
        context.bind(ParticipantRole::User, Node::new("User", Map::new()));
        context.bind(ParticipantRole::Node, Node::new("Schedule", Map::new()));

        assert!(select_event_roles(&EventNodes::Enabled(false), &context).is_empty());
        assert_eq!(
            select_event_roles(&EventNodes::Enabled(true), &context),
            vec![ParticipantRole::User]
        );

        let mut flags = indexmap::IndexMap::new();
        flags.insert(ParticipantRole::User, false);
        flags.insert(ParticipantRole::Node, true);
        assert_eq!(
            select_event_roles(&EventNodes::Roles(flags), &context),
            vec![ParticipantRole::Node]
        );
    }

    #[tokio::test]
    async fn test_emit_links_owner_and_subject() {
        let graph = MemoryGraph::new();
        let user = seed(&graph, "User").await;
        let activity = seed(&graph, "Activity").await;
        let mut context = OperationContext::new();
        context.bind(ParticipantRole::User, user.clone());
        context.bind(ParticipantRole::Node, activity.clone());

        let config = GraphConfig::default();
        let clock = clock();
        let emitter = EventEmitter::new(&graph, &config, &clock);
        let events = emitter
            .emit(&context, &[ParticipantRole::User])
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0].node;
        assert_eq!(event.label, "_ActivityCreated");
        assert_eq!(event.get_str("role"), Some("user"));
        assert_eq!(event.get_str("createdAt"), Some("2025-01-03T09:30:00+00:00"));
        assert_eq!(events[0].owner_id, user.id);

        assert_eq!(graph.count_relationships("EVENT_USER").await, 1);
        assert_eq!(graph.count_relationships("EVENT_ACTIVITY").await, 1);
        assert_eq!(graph.count_relationships("LATEST_EVENT").await, 1);
    }

    #[tokio::test]
    async fn test_successive_events_chain_with_next() {
        let graph = MemoryGraph::new();
        let user = seed(&graph, "User").await;
        let config = GraphConfig::default();
        let clock = clock();
        let emitter = EventEmitter::new(&graph, &config, &clock);

        let mut ids = Vec::new();
        for label in ["Schedule", "Activity"] {
            let subject = seed(&graph, label).await;
            let mut context = OperationContext::new();
            context.bind(ParticipantRole::User, user.clone());
            context.bind(ParticipantRole::Node, subject);
            let events = emitter
                .emit(&context, &[ParticipantRole::User])
                .await
                .unwrap();
            ids.push(events[0].node.id.clone());
        }

        let latest = graph
            .execute(GraphQuery::MatchRelated {
                id: user.id.clone(),
                rel_type: "LATEST_EVENT".to_string(),
                direction: MatchDirection::Outgoing,
                label: None,
            })
            .await
            .unwrap();
        assert_eq!(latest.nodes[0].id, ids[1]);

        let next = graph
            .execute(GraphQuery::MatchRelated {
                id: ids[1].clone(),
                rel_type: "NEXT".to_string(),
                direction: MatchDirection::Outgoing,
                label: None,
            })
            .await
            .unwrap();
        assert_eq!(next.nodes[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_unbound_owner_fails() {
        let graph = MemoryGraph::new();
        let mut context = OperationContext::new();
        context.bind(ParticipantRole::Node, seed(&graph, "Activity").await);

        let config = GraphConfig::default();
        let clock = clock();
        let err = EventEmitter::new(&graph, &config, &clock)
            .emit(&context, &[ParticipantRole::User])
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
