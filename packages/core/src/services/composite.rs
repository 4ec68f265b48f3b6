//! Composite Creation
//!
//! A composite creation creates one entity and everything that hangs off
//! it in a fixed order:
//!
//! 1. validate options and coerce properties (no store access)
//! 2. resolve the acting entity and the relationship target (reads only)
//! 3. create the entity
//! 4. link it to the relationship target
//! 5. attach a role node, or link the role owner (role creation)
//! 6. emit event nodes
//! 7. increment counters
//!
//! The first failing step ends the operation and its error is returned
//! unchanged. Steps 3-7 are separate store statements: a failure part way
//! through leaves the earlier mutations in place. The completed steps are
//! logged at `warn` so partial writes can be found and repaired.
//!
//! # Role nodes
//!
//! A role ties a participant to an entity under a name:
//!
//! ```text
//! (user)-[:HAS_ROLE]->(:_ScheduleRole {role: "Admin"})-[:HAS_SCHEDULE]->(schedule)
//! ```
//!
//! `create_with_relationship` attaches one when `options.role` is set;
//! `create_role` creates one as the primary entity.

use crate::db::GraphQuery;
use crate::models::{
    ensure_identifier, CounterSpec, CreateOptions, Direction, EventNodes, Node, ParticipantRole,
    Relationship, RoleSpec, ValidationError,
};
use crate::services::context::OperationContext;
use crate::services::counter_updater::{CounterUpdate, CounterUpdater};
use crate::services::error::ModelServiceError;
use crate::services::event_emitter::{select_event_roles, EventEmitter, EventNode};
use crate::services::model_service::ModelService;
use crate::services::relationship_builder::RelationshipBuilder;
use crate::services::resolver::ReferenceResolver;
use serde::Serialize;
use serde_json::{Map, Value};

/// Mutating steps of a composite creation, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStep {
    CreateNode,
    LinkReference,
    AttachRole,
    EmitEvents,
    IncrementCounters,
}

impl CreationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationStep::CreateNode => "create-node",
            CreationStep::LinkReference => "link-reference",
            CreationStep::AttachRole => "attach-role",
            CreationStep::EmitEvents => "emit-events",
            CreationStep::IncrementCounters => "increment-counters",
        }
    }
}

/// Everything a composite creation wrote
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntity {
    /// The primary entity (the role node for `create_role`), with counter
    /// updates that targeted it applied
    pub node: Node,
    /// Relationship to the relationship target
    pub relationship: Option<Relationship>,
    /// Role node attached through `options.role`
    pub role: Option<Node>,
    pub events: Vec<EventNode>,
    pub counters: Vec<CounterUpdate>,
}

/// Steps applied so far, for failure reporting
struct CreationProgress<'a> {
    model: &'a str,
    completed: Vec<CreationStep>,
}

impl<'a> CreationProgress<'a> {
    fn new(model: &'a str) -> Self {
        Self {
            model,
            completed: Vec::new(),
        }
    }

    fn complete(&mut self, step: CreationStep) {
        self.completed.push(step);
    }

    fn report_failure(&self, error: &ModelServiceError) {
        if self.completed.is_empty() {
            tracing::debug!("{} creation rejected: {}", self.model, error);
            return;
        }
        let steps: Vec<&str> = self.completed.iter().map(CreationStep::as_str).collect();
        tracing::warn!(
            "{} creation failed after [{}], earlier writes remain: {}",
            self.model,
            steps.join(", "),
            error
        );
    }
}

struct ReferenceLink {
    rel_type: String,
    direction: Direction,
}

enum RoleStep {
    None,
    /// Create a named role node: owner -> role -> new entity
    Attach {
        owner: ParticipantRole,
        name: String,
    },
    /// The new entity is itself a role node: owner -> new entity
    LinkOwner(ParticipantRole),
}

struct CreationPlan {
    node: Node,
    reference: Option<ReferenceLink>,
    role: RoleStep,
    event_nodes: EventNodes,
    counters: Vec<CounterSpec>,
}

/// Check that every role named by event and counter options will be bound
fn validate_role_options(
    bound: &[ParticipantRole],
    options: &CreateOptions,
) -> Result<(), ValidationError> {
    if let EventNodes::Roles(flags) = &options.event_nodes {
        for (role, flag) in flags {
            if *flag && !bound.contains(role) {
                return Err(ValidationError::UnboundRole(role.to_string()));
            }
        }
    }
    for counter in &options.counters {
        if !bound.contains(&counter.node) {
            return Err(ValidationError::UnboundRole(counter.node.to_string()));
        }
        ensure_identifier("counters.field", &counter.field)?;
    }
    Ok(())
}

/// Missing and blank values are both "required"
fn required_value(value: Option<String>, path: &str) -> Result<String, ValidationError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ValidationError::required(path)),
    }
}

impl ModelService {
    /// Create an entity of `model` together with its relationship, role,
    /// events and counters
    ///
    /// - `reference_id` identifies the acting entity (bound as `user`) and
    ///   is required when `options.relationship` is set
    /// - `options.relationship` names the existing entity to relate to
    ///   (bound as `relationshipNode`)
    ///
    /// # Errors
    ///
    /// - `Validation` - bad options or properties; nothing was read or written
    /// - `NotFound` - a reference did not resolve; nothing was written
    /// - `Store` / `Inconsistent` - a write failed; earlier writes remain
    pub async fn create_with_relationship(
        &self,
        model: &str,
        properties: Map<String, Value>,
        reference_id: Option<&str>,
        options: CreateOptions,
    ) -> Result<CreatedEntity, ModelServiceError> {
        let definition = self.registry.get(model)?;

        let reference_id = match reference_id {
            Some(id) => Some(required_value(Some(id.to_string()), "referenceId")?),
            None => None,
        };
        let reference = match &options.relationship {
            Some(spec) => {
                if reference_id.is_none() {
                    return Err(ValidationError::required("referenceId").into());
                }
                Some(ReferenceLink {
                    rel_type: spec.rel_type.clone(),
                    direction: spec.validate()?,
                })
            }
            None => None,
        };

        let mut bound = vec![ParticipantRole::Node];
        if reference_id.is_some() {
            bound.push(ParticipantRole::User);
        }
        if options.relationship.is_some() {
            bound.push(ParticipantRole::RelationshipNode);
        }
        validate_role_options(&bound, &options)?;

        let role = match &options.role {
            Some(role) => {
                if !bound.contains(&role.role_owner) {
                    return Err(ValidationError::UnboundRole(role.role_owner.to_string()).into());
                }
                RoleStep::Attach {
                    owner: role.role_owner,
                    name: required_value(Some(role.name.clone()), "role.name")?,
                }
            }
            None => RoleStep::None,
        };

        let properties = definition.schema.coerce(properties)?;

        let resolver = ReferenceResolver::new(self.executor.as_ref());
        let mut context = OperationContext::new();
        if let Some(id) = &reference_id {
            context.bind(ParticipantRole::User, resolver.resolve_id(id).await?);
        }
        if let Some(spec) = &options.relationship {
            let target = resolver
                .resolve(&spec.node_label, &spec.index_field, &spec.index_value)
                .await?;
            context.bind(ParticipantRole::RelationshipNode, target);
        }

        let plan = CreationPlan {
            node: Node::new(definition.label.clone(), properties),
            reference,
            role,
            event_nodes: options.event_nodes,
            counters: options.counters,
        };
        self.run_plan(&definition.name, plan, context).await
    }

    /// Create a named role granting `role.user` a role on the `model` entity
    /// `role.other`
    ///
    /// ```text
    /// (user)-[:HAS_ROLE]->(:_<Model>Role {role: name})-[:HAS_<MODEL>]->(other)
    /// ```
    ///
    /// Only `event_nodes` and `counters` of `options` apply; the role node
    /// is bound as `node`, the user as `user` and the target as
    /// `relationshipNode`. The returned entity's `node` is the role node.
    pub async fn create_role(
        &self,
        model: &str,
        role: Option<RoleSpec>,
        options: Option<CreateOptions>,
    ) -> Result<CreatedEntity, ModelServiceError> {
        let definition = self.registry.get(model)?;

        let role = role.ok_or_else(|| ValidationError::required("role"))?;
        let user_id = required_value(role.user, "role.user")?;
        let other_id = required_value(role.other, "role.other")?;
        let name = required_value(role.name, "role.name")?;

        let options = options.unwrap_or_default();
        if options.relationship.is_some() || options.role.is_some() {
            tracing::warn!(
                "create_role on {} ignores relationship and role options",
                definition.name
            );
        }
        validate_role_options(
            &[
                ParticipantRole::Node,
                ParticipantRole::User,
                ParticipantRole::RelationshipNode,
            ],
            &options,
        )?;

        let resolver = ReferenceResolver::new(self.executor.as_ref());
        let mut context = OperationContext::new();
        context.bind(ParticipantRole::User, resolver.resolve_id(&user_id).await?);
        context.bind(
            ParticipantRole::RelationshipNode,
            resolver
                .resolve_labeled_id(&definition.label, &other_id)
                .await?,
        );

        let plan = CreationPlan {
            node: self.role_node(&definition.label, name),
            reference: Some(ReferenceLink {
                rel_type: self.config.role_target_type(&definition.label),
                direction: Direction::To,
            }),
            role: RoleStep::LinkOwner(ParticipantRole::User),
            event_nodes: options.event_nodes,
            counters: options.counters,
        };
        self.run_plan(&definition.name, plan, context).await
    }

    fn role_node(&self, label: &str, name: String) -> Node {
        let mut properties = Map::new();
        properties.insert("role".to_string(), Value::String(name));
        Node::new(self.config.role_label(label), properties)
    }

    async fn run_plan(
        &self,
        model: &str,
        plan: CreationPlan,
        mut context: OperationContext,
    ) -> Result<CreatedEntity, ModelServiceError> {
        let mut progress = CreationProgress::new(model);
        let result = self.apply_plan(plan, &mut context, &mut progress).await;

        match &result {
            Ok(created) => tracing::info!(
                "Created {} {} ({} events, {} counters)",
                created.node.label,
                created.node.id,
                created.events.len(),
                created.counters.len()
            ),
            Err(e) => progress.report_failure(e),
        }
        result
    }

    async fn apply_plan(
        &self,
        plan: CreationPlan,
        context: &mut OperationContext,
        progress: &mut CreationProgress<'_>,
    ) -> Result<CreatedEntity, ModelServiceError> {
        let executor = self.executor.as_ref();
        let builder = RelationshipBuilder::new(executor);

        let mut node = executor
            .execute(GraphQuery::CreateNode { node: plan.node })
            .await?
            .into_first_node()
            .ok_or_else(|| ModelServiceError::inconsistent("store returned no created node"))?;
        context.bind(ParticipantRole::Node, node.clone());
        progress.complete(CreationStep::CreateNode);

        let relationship = match plan.reference {
            Some(link) => {
                let target = context.require(ParticipantRole::RelationshipNode)?;
                let relationship = builder
                    .link(&node, target, &link.rel_type, link.direction, Map::new())
                    .await?;
                progress.complete(CreationStep::LinkReference);
                Some(relationship)
            }
            None => None,
        };

        let role = match plan.role {
            RoleStep::None => None,
            RoleStep::Attach { owner, name } => {
                let owner = context.require(owner)?;
                let role = executor
                    .execute(GraphQuery::CreateNode {
                        node: self.role_node(&node.label, name),
                    })
                    .await?
                    .into_first_node()
                    .ok_or_else(|| ModelServiceError::inconsistent("store returned no role node"))?;
                builder
                    .connect(owner, &role, &self.config.role_owner_type, Map::new())
                    .await?;
                builder
                    .connect(
                        &role,
                        &node,
                        &self.config.role_target_type(&node.label),
                        Map::new(),
                    )
                    .await?;
                progress.complete(CreationStep::AttachRole);
                Some(role)
            }
            RoleStep::LinkOwner(owner) => {
                let owner = context.require(owner)?;
                builder
                    .connect(owner, &node, &self.config.role_owner_type, Map::new())
                    .await?;
                progress.complete(CreationStep::AttachRole);
                None
            }
        };

        let event_roles = if plan.event_nodes.is_disabled() {
            Vec::new()
        } else {
            select_event_roles(&plan.event_nodes, context)
        };
        let events = if event_roles.is_empty() {
            Vec::new()
        } else {
            let events = EventEmitter::new(executor, &self.config, self.clock.as_ref())
                .emit(context, &event_roles)
                .await?;
            progress.complete(CreationStep::EmitEvents);
            events
        };

        let counters = if plan.counters.is_empty() {
            Vec::new()
        } else {
            let updates = CounterUpdater::new(executor)
                .increment(context, &plan.counters)
                .await?;
            progress.complete(CreationStep::IncrementCounters);
            updates
        };
        for update in counters.iter().filter(|u| u.node_id == node.id) {
            node.properties
                .insert(update.field.clone(), update.value.clone());
        }

        Ok(CreatedEntity {
            node,
            relationship,
            role,
            events,
            counters,
        })
    }
}
