//! Model Services
//!
//! This module contains the model-level operations built on a
//! `GraphExecutor`:
//!
//! - `ModelRegistry` - named models with their labels and schemas
//! - `ModelService` / `Model` - entity lookups, updates and composite creation
//! - `ReferenceResolver` - locates entities named by id or index field
//! - `RelationshipBuilder` - creates one typed relationship per call
//! - `EventEmitter` - audit event nodes with per-participant latest-event chains
//! - `CounterUpdater` - atomic counter increments on participants
//!
//! Composite creation (`services::composite`) orchestrates the last four in
//! a fixed order for each call.

pub mod composite;
pub mod context;
pub mod counter_updater;
pub mod error;
pub mod event_emitter;
pub mod model_service;
pub mod registry;
pub mod relationship_builder;
pub mod resolver;

pub use composite::{CreatedEntity, CreationStep};
pub use context::OperationContext;
pub use counter_updater::{CounterUpdate, CounterUpdater};
pub use error::ModelServiceError;
pub use event_emitter::{select_event_roles, EventEmitter, EventNode};
pub use model_service::{Model, ModelService, RelatedNodes};
pub use registry::{ModelDefinition, ModelRegistry, ModelRegistryBuilder};
pub use relationship_builder::RelationshipBuilder;
pub use resolver::ReferenceResolver;
