//! NodeGraph Core Model Layer
//!
//! This crate provides typed model schemas and composite entity creation
//! on top of a labeled property graph.
//!
//! # Architecture
//!
//! - **Models**: each model has a label and a schema that coerces input
//!   properties before they reach the store
//! - **Composite creation**: one call creates an entity, relates it to an
//!   existing entity, attaches a role, records audit event nodes and bumps
//!   counters on participants
//! - **Executor seam**: every store access goes through `GraphExecutor`;
//!   `MemoryGraph` is the in-process implementation
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, Relationship, ModelSchema, CreateOptions)
//! - [`services`] - Model services (ModelService, ModelRegistry, composite creation)
//! - [`db`] - Graph store layer (GraphExecutor, GraphQuery, MemoryGraph)
//! - [`config`] - Naming conventions for role and event structures

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::GraphConfig;
pub use models::*;
pub use services::*;
