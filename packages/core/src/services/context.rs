//! Per-Operation Binding Context
//!
//! One `OperationContext` lives for the duration of a single composite
//! creation. It maps participant roles to the entities bound to them so
//! that event and counter options can name entities by role.

use crate::models::{Node, ParticipantRole, ValidationError};

/// Role -> entity bindings for one composite creation
///
/// Bindings keep insertion order; binding a role twice replaces the entity
/// in place.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    bindings: Vec<(ParticipantRole, Node)>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `role` to `node`
    pub fn bind(&mut self, role: ParticipantRole, node: Node) {
        match self.bindings.iter_mut().find(|(bound, _)| *bound == role) {
            Some(slot) => slot.1 = node,
            None => self.bindings.push((role, node)),
        }
    }

    pub fn get(&self, role: ParticipantRole) -> Option<&Node> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == role)
            .map(|(_, node)| node)
    }

    /// Get the entity bound to `role`, or an unbound-role error
    pub fn require(&self, role: ParticipantRole) -> Result<&Node, ValidationError> {
        self.get(role)
            .ok_or_else(|| ValidationError::UnboundRole(role.to_string()))
    }

    pub fn is_bound(&self, role: ParticipantRole) -> bool {
        self.get(role).is_some()
    }

    /// Bound roles in binding order
    pub fn roles(&self) -> impl Iterator<Item = ParticipantRole> + '_ {
        self.bindings.iter().map(|(role, _)| *role)
    }

    /// Refresh every binding of the entity `node.id` (e.g. after a counter
    /// moved one of its properties)
    pub fn refresh(&mut self, node: &Node) {
        for (_, bound) in self.bindings.iter_mut() {
            if bound.id == node.id {
                *bound = node.clone();
            }
        }
    }
}
