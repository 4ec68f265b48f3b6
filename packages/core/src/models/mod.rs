//! Data Models
//!
//! This module contains the core data structures used throughout NodeGraph:
//!
//! - `Node` / `Relationship` - graph records
//! - `ModelSchema` - typed field definitions with defaults and strictness
//! - `CreateOptions` - per-call configuration of a composite creation
//! - `TimeProvider` - injectable clock for event timestamps

mod node;
mod options;
mod schema;
pub mod time;

pub use node::{
    ensure_identifier, is_valid_identifier, Node, Relationship, ValidationError, ID_FIELD,
};
pub use options::{
    CounterSpec, CreateOptions, Direction, EventNodes, ParticipantRole, RelationshipSpec,
    RoleOption, RoleSpec,
};
pub use schema::{FieldDefinition, FieldType, ModelSchema};
pub use time::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
