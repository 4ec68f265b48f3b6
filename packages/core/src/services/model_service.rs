//! Model Service - Entry Point for Model Operations
//!
//! `ModelService` ties a graph executor, the model registry, naming
//! configuration and a clock together. Callers either use it directly with
//! a model name, or take a `Model` handle bound to one model:
//!
//! ```rust
//! use std::sync::Arc;
//! use nodegraph_core::db::MemoryGraph;
//! use nodegraph_core::models::{FieldType, ModelSchema};
//! use nodegraph_core::services::{ModelRegistry, ModelService};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let registry = ModelRegistry::builder()
//!     .register("User", ModelSchema::new().field("first", FieldType::String))
//!     .unwrap()
//!     .build();
//! let service = ModelService::new(Arc::new(MemoryGraph::new()), Arc::new(registry));
//!
//! let users = service.model("User").unwrap();
//! let user = users
//!     .create(json!({"first": "John"}).as_object().cloned().unwrap())
//!     .await
//!     .unwrap();
//! assert_eq!(user.label, "User");
//! # });
//! ```
//!
//! Composite creation (`create_with_relationship`, `create_role`) lives in
//! `services::composite`; this module holds construction, lookups and
//! plain property updates.

use crate::config::GraphConfig;
use crate::db::{GraphExecutor, GraphQuery, MatchDirection};
use crate::models::{
    ensure_identifier, CreateOptions, Node, Relationship, RoleSpec, SystemTimeProvider,
    TimeProvider, ValidationError, ID_FIELD,
};
use crate::services::composite::CreatedEntity;
use crate::services::error::ModelServiceError;
use crate::services::registry::{ModelDefinition, ModelRegistry};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Relationships of one type touching a node, paired with the node on the
/// other end of each
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelatedNodes {
    pub relationships: Vec<Relationship>,
    pub nodes: Vec<Node>,
}

impl RelatedNodes {
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

#[derive(Clone)]
pub struct ModelService {
    pub(crate) executor: Arc<dyn GraphExecutor>,
    pub(crate) registry: Arc<ModelRegistry>,
    pub(crate) config: GraphConfig,
    pub(crate) clock: Arc<dyn TimeProvider>,
}

impl ModelService {
    /// Create a service with default naming and the system clock
    pub fn new(executor: Arc<dyn GraphExecutor>, registry: Arc<ModelRegistry>) -> Self {
        Self {
            executor,
            registry,
            config: GraphConfig::default(),
            clock: Arc::new(SystemTimeProvider),
        }
    }

    /// Replace the naming configuration
    pub fn with_config(mut self, config: GraphConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Replace the clock used to stamp event nodes
    pub fn with_time_provider(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn executor(&self) -> &dyn GraphExecutor {
        self.executor.as_ref()
    }

    /// Get a handle bound to one registered model
    pub fn model(&self, name: &str) -> Result<Model, ValidationError> {
        Ok(Model {
            service: self.clone(),
            definition: self.registry.get(name)?,
        })
    }

    /// Create a plain entity: no relationship, no counters, no role
    ///
    /// Default event selection applies, which emits nothing when no other
    /// participant is bound.
    pub async fn create(
        &self,
        model: &str,
        properties: Map<String, Value>,
    ) -> Result<Node, ModelServiceError> {
        let created = self
            .create_with_relationship(model, properties, None, CreateOptions::new())
            .await?;
        Ok(created.node)
    }

    /// Fetch an entity of `model` by id
    pub async fn find_by_id(&self, model: &str, id: &str) -> Result<Option<Node>, ModelServiceError> {
        self.find_one(model, ID_FIELD, Value::String(id.to_string()))
            .await
    }

    /// Fetch the first entity of `model` whose `field` equals `value`
    pub async fn find_one(
        &self,
        model: &str,
        field: &str,
        value: Value,
    ) -> Result<Option<Node>, ModelServiceError> {
        let definition = self.registry.get(model)?;
        ensure_identifier("field", field)?;

        let result = self
            .executor
            .execute(GraphQuery::FindNodes {
                label: definition.label.clone(),
                field: field.to_string(),
                value,
                limit: Some(1),
            })
            .await?;
        Ok(result.into_first_node())
    }

    /// Merge coerced properties into an existing entity of `model`
    pub async fn update(
        &self,
        model: &str,
        id: &str,
        properties: Map<String, Value>,
    ) -> Result<Node, ModelServiceError> {
        let definition = self.registry.get(model)?;
        let properties = definition.schema.coerce_partial(properties)?;

        if self.find_by_id(model, id).await?.is_none() {
            return Err(ModelServiceError::not_found(
                definition.label.clone(),
                ID_FIELD,
                Value::String(id.to_string()),
            ));
        }

        let updated = self
            .executor
            .execute(GraphQuery::SetProperties {
                id: id.to_string(),
                properties,
            })
            .await?
            .into_first_node()
            .ok_or_else(|| ModelServiceError::inconsistent(format!("{} vanished during update", id)))?;

        tracing::debug!("Updated {} {}", definition.label, id);
        Ok(updated)
    }

    /// Relationships of `rel_type` ending at `node_id`, optionally only those
    /// starting at a node labeled `label`
    pub async fn incoming_relationships(
        &self,
        node_id: &str,
        rel_type: &str,
        label: Option<&str>,
    ) -> Result<RelatedNodes, ModelServiceError> {
        self.related(node_id, rel_type, MatchDirection::Incoming, label)
            .await
    }

    /// Relationships of `rel_type` starting at `node_id`, optionally only
    /// those ending at a node labeled `label`
    pub async fn outgoing_relationships(
        &self,
        node_id: &str,
        rel_type: &str,
        label: Option<&str>,
    ) -> Result<RelatedNodes, ModelServiceError> {
        self.related(node_id, rel_type, MatchDirection::Outgoing, label)
            .await
    }

    async fn related(
        &self,
        node_id: &str,
        rel_type: &str,
        direction: MatchDirection,
        label: Option<&str>,
    ) -> Result<RelatedNodes, ModelServiceError> {
        ensure_identifier("relationship type", rel_type)?;
        if let Some(label) = label {
            ensure_identifier("label", label)?;
        }

        let result = self
            .executor
            .execute(GraphQuery::MatchRelated {
                id: node_id.to_string(),
                rel_type: rel_type.to_string(),
                direction,
                label: label.map(str::to_string),
            })
            .await?;

        Ok(RelatedNodes {
            relationships: result.relationships,
            nodes: result.nodes,
        })
    }
}

/// A `ModelService` bound to one registered model
#[derive(Clone)]
pub struct Model {
    service: ModelService,
    definition: Arc<ModelDefinition>,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn label(&self) -> &str {
        &self.definition.label
    }

    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    pub async fn create(&self, properties: Map<String, Value>) -> Result<Node, ModelServiceError> {
        self.service.create(self.name(), properties).await
    }

    /// See `ModelService::create_with_relationship`
    pub async fn create_with_relationship(
        &self,
        properties: Map<String, Value>,
        reference_id: Option<&str>,
        options: CreateOptions,
    ) -> Result<CreatedEntity, ModelServiceError> {
        self.service
            .create_with_relationship(self.name(), properties, reference_id, options)
            .await
    }

    /// See `ModelService::create_role`
    pub async fn create_role(
        &self,
        role: Option<RoleSpec>,
        options: Option<CreateOptions>,
    ) -> Result<CreatedEntity, ModelServiceError> {
        self.service.create_role(self.name(), role, options).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Node>, ModelServiceError> {
        self.service.find_by_id(self.name(), id).await
    }

    pub async fn find_one(&self, field: &str, value: Value) -> Result<Option<Node>, ModelServiceError> {
        self.service.find_one(self.name(), field, value).await
    }

    pub async fn update(
        &self,
        id: &str,
        properties: Map<String, Value>,
    ) -> Result<Node, ModelServiceError> {
        self.service.update(self.name(), id, properties).await
    }
}
