//! Graph Store Layer
//!
//! This module holds everything between the model services and a graph
//! store:
//!
//! - `GraphExecutor` - the single async entry point for running statements
//! - `GraphQuery` - the closed set of parameterized statements, renderable
//!   as Cypher templates for remote backends
//! - `MemoryGraph` - an in-process executor with per-statement atomicity
//! - `DomainEvent` - mutation notifications broadcast by `MemoryGraph`
//!
//! Talking to a remote store (connection setup, wire protocol) is left to
//! `GraphExecutor` implementations outside this crate.

mod error;
pub mod events;
mod graph_executor;
mod memory_store;
mod query;

pub use error::StoreError;
pub use events::DomainEvent;
pub use graph_executor::GraphExecutor;
pub use memory_store::{GraphStats, MemoryGraph};
pub use query::{CypherStatement, GraphQuery, MatchDirection, QueryResult};
