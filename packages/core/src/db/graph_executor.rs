//! GraphExecutor Trait - Graph Store Abstraction
//!
//! This module defines the single entry point through which the model layer
//! talks to a graph store: run one parameterized statement, get back nodes,
//! relationships or a scalar.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: each `execute` call is one suspension point; the
//!    model layer awaits it before issuing the next statement
//! 2. **Closed statement set**: callers build `GraphQuery` values, never raw
//!    query strings, so untrusted input only ever travels as parameters
//! 3. **Atomic statements**: an implementation must apply each statement
//!    atomically. `IncrementProperty` in particular must not lose updates
//!    under concurrent callers
//! 4. **No cross-statement transactions**: a composite creation is a
//!    sequence of independent statements
//!
//! # Examples
//!
//! ```rust
//! use nodegraph_core::db::{GraphExecutor, GraphQuery, MemoryGraph};
//! use nodegraph_core::models::Node;
//! use serde_json::Map;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let executor: Arc<dyn GraphExecutor> = Arc::new(MemoryGraph::new());
//! let node = Node::new("User", Map::new());
//! let created = executor
//!     .execute(GraphQuery::CreateNode { node })
//!     .await?
//!     .into_first_node();
//! assert!(created.is_some());
//! # Ok(())
//! # }
//! ```

use crate::db::error::StoreError;
use crate::db::query::{GraphQuery, QueryResult};
use async_trait::async_trait;

/// Executes parameterized statements against a graph store
///
/// Implementations must be `Send + Sync` so one executor can be shared by
/// many concurrent composite creations.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    /// Run one statement atomically
    ///
    /// # Errors
    ///
    /// - `MalformedQuery` when the statement fails [`GraphQuery::validate`]
    /// - `NodeNotFound` when a referenced node does not exist
    /// - `DuplicateId` when a created node reuses an existing `_id`
    /// - `NotNumeric` when incrementing a non-numeric property
    /// - `Backend` for connectivity or protocol failures
    async fn execute(&self, query: GraphQuery) -> Result<QueryResult, StoreError>;
}
