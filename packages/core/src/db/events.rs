//! Domain Events for MemoryGraph
//!
//! Every mutation applied by `MemoryGraph` is announced on a tokio broadcast
//! channel, so observers (tests, audit sinks, live views) can follow graph
//! changes without coupling to the store.
//!
//! # Event Flow
//!
//! 1. MemoryGraph applies a statement under its write lock
//! 2. The lock is released and one event per changed record is emitted
//! 3. All subscribers receive the events asynchronously

use crate::models::{Node, Relationship};

/// Domain events emitted by MemoryGraph
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// A new node was created
    NodeCreated(Node),

    /// An existing node's properties changed (property update, counter increment)
    NodeUpdated(Node),

    /// A new relationship was created
    RelationshipCreated(Relationship),

    /// A relationship was removed (latest-event pointer moved)
    RelationshipDeleted { id: String },
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NodeCreated(_) => "node:created",
            DomainEvent::NodeUpdated(_) => "node:updated",
            DomainEvent::RelationshipCreated(_) => "relationship:created",
            DomainEvent::RelationshipDeleted { .. } => "relationship:deleted",
        }
    }
}
