//! Parameterized Graph Statements
//!
//! `GraphQuery` is the closed set of statements the model layer issues
//! through a `GraphExecutor`. Every statement renders to a Cypher template
//! plus a parameter map via [`GraphQuery::to_cypher`]:
//!
//! - values (property maps, ids, index values) are always parameters
//! - labels, relationship types and field names cannot be parameters in
//!   Cypher, so they must pass [`GraphQuery::validate`] and are back-quoted
//!
//! ```rust
//! use nodegraph_core::db::GraphQuery;
//! use serde_json::json;
//!
//! let query = GraphQuery::FindNodes {
//!     label: "User".to_string(),
//!     field: "_id".to_string(),
//!     value: json!("abc"),
//!     limit: Some(2),
//! };
//! let statement = query.to_cypher();
//! assert_eq!(
//!     statement.template,
//!     "MATCH (n:`User`) WHERE n.`_id` = $value RETURN n LIMIT $limit"
//! );
//! assert_eq!(statement.params["value"], json!("abc"));
//! ```

use crate::db::error::StoreError;
use crate::models::{is_valid_identifier, Node, Relationship, ID_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Traversal direction for `MatchRelated`, relative to the anchor node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDirection {
    Outgoing,
    Incoming,
}

/// A statement for the graph store
#[derive(Debug, Clone, PartialEq)]
pub enum GraphQuery {
    /// Create a node; its `_id` property must be unique
    CreateNode { node: Node },

    /// Fetch a node by `_id` regardless of label
    GetNode { id: String },

    /// Index lookup: nodes of `label` whose `field` equals `value`
    FindNodes {
        label: String,
        field: String,
        value: Value,
        limit: Option<usize>,
    },

    /// Create a relationship between two existing nodes
    CreateRelationship {
        start: String,
        end: String,
        rel_type: String,
        properties: Map<String, Value>,
    },

    /// Move `owner`'s latest-event pointer to `event`, chaining the
    /// previous latest event behind it with a `next_type` relationship
    AdvanceLatestEvent {
        owner: String,
        event: String,
        latest_type: String,
        next_type: String,
    },

    /// Atomically add `by` to a numeric property (absent counts as 0)
    IncrementProperty { id: String, field: String, by: i64 },

    /// Merge properties into a node (`_id` is immutable)
    SetProperties {
        id: String,
        properties: Map<String, Value>,
    },

    /// Relationships of `rel_type` touching a node, with the node on the
    /// other end optionally filtered by label
    MatchRelated {
        id: String,
        rel_type: String,
        direction: MatchDirection,
        label: Option<String>,
    },
}

/// A rendered Cypher template with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CypherStatement {
    pub template: String,
    pub params: Map<String, Value>,
}

impl CypherStatement {
    fn new(template: String, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { template, params }
    }
}

impl GraphQuery {
    /// Short statement name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            GraphQuery::CreateNode { .. } => "create_node",
            GraphQuery::GetNode { .. } => "get_node",
            GraphQuery::FindNodes { .. } => "find_nodes",
            GraphQuery::CreateRelationship { .. } => "create_relationship",
            GraphQuery::AdvanceLatestEvent { .. } => "advance_latest_event",
            GraphQuery::IncrementProperty { .. } => "increment_property",
            GraphQuery::SetProperties { .. } => "set_properties",
            GraphQuery::MatchRelated { .. } => "match_related",
        }
    }

    /// Whether the statement changes graph state
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            GraphQuery::GetNode { .. } | GraphQuery::FindNodes { .. } | GraphQuery::MatchRelated { .. }
        )
    }

    fn identifiers(&self) -> Vec<(&'static str, &str)> {
        match self {
            GraphQuery::CreateNode { node } => vec![("label", node.label.as_str())],
            GraphQuery::GetNode { .. } | GraphQuery::SetProperties { .. } => Vec::new(),
            GraphQuery::FindNodes { label, field, .. } => {
                vec![("label", label.as_str()), ("field", field.as_str())]
            }
            GraphQuery::CreateRelationship { rel_type, .. } => vec![("type", rel_type.as_str())],
            GraphQuery::AdvanceLatestEvent {
                latest_type,
                next_type,
                ..
            } => vec![("type", latest_type.as_str()), ("type", next_type.as_str())],
            GraphQuery::IncrementProperty { field, .. } => vec![("field", field.as_str())],
            GraphQuery::MatchRelated {
                rel_type, label, ..
            } => {
                let mut ids = vec![("type", rel_type.as_str())];
                if let Some(label) = label {
                    ids.push(("label", label.as_str()));
                }
                ids
            }
        }
    }

    /// Reject statements whose identifiers could not be embedded safely
    pub fn validate(&self) -> Result<(), StoreError> {
        for (what, name) in self.identifiers() {
            if !is_valid_identifier(name) {
                return Err(StoreError::malformed(format!(
                    "{} statement has invalid {} {:?}",
                    self.kind(),
                    what,
                    name
                )));
            }
        }
        if let GraphQuery::CreateNode { node } = self {
            if node.get_str(ID_FIELD) != Some(node.id.as_str()) {
                return Err(StoreError::malformed(format!(
                    "node {} does not carry a matching {} property",
                    node.id, ID_FIELD
                )));
            }
        }
        Ok(())
    }

    /// Render as a Cypher template plus parameters
    pub fn to_cypher(&self) -> CypherStatement {
        match self {
            GraphQuery::CreateNode { node } => CypherStatement::new(
                format!("CREATE (n:`{}` $props) RETURN n", node.label),
                json!({ "props": node.properties }),
            ),
            GraphQuery::GetNode { id } => CypherStatement::new(
                format!("MATCH (n) WHERE n.`{}` = $id RETURN n", ID_FIELD),
                json!({ "id": id }),
            ),
            GraphQuery::FindNodes {
                label,
                field,
                value,
                limit,
            } => {
                let mut template = format!(
                    "MATCH (n:`{}`) WHERE n.`{}` = $value RETURN n",
                    label, field
                );
                let mut params = json!({ "value": value });
                if let Some(limit) = limit {
                    template.push_str(" LIMIT $limit");
                    params["limit"] = json!(limit);
                }
                CypherStatement::new(template, params)
            }
            GraphQuery::CreateRelationship {
                start,
                end,
                rel_type,
                properties,
            } => CypherStatement::new(
                format!(
                    "MATCH (a {{`{id}`: $start}}), (b {{`{id}`: $end}}) \
                     CREATE (a)-[r:`{rel}` $props]->(b) RETURN r",
                    id = ID_FIELD,
                    rel = rel_type
                ),
                json!({ "start": start, "end": end, "props": properties }),
            ),
            GraphQuery::AdvanceLatestEvent {
                owner,
                event,
                latest_type,
                next_type,
            } => CypherStatement::new(
                format!(
                    "MATCH (o {{`{id}`: $owner}}), (e {{`{id}`: $event}}) \
                     OPTIONAL MATCH (o)-[old:`{latest}`]->(prev) \
                     DELETE old \
                     CREATE (o)-[:`{latest}`]->(e) \
                     FOREACH (p IN CASE WHEN prev IS NULL THEN [] ELSE [prev] END | \
                     CREATE (e)-[:`{next}`]->(p)) \
                     RETURN e",
                    id = ID_FIELD,
                    latest = latest_type,
                    next = next_type
                ),
                json!({ "owner": owner, "event": event }),
            ),
            GraphQuery::IncrementProperty { id, field, by } => CypherStatement::new(
                format!(
                    "MATCH (n {{`{id}`: $id}}) \
                     SET n.`{f}` = coalesce(n.`{f}`, 0) + $by RETURN n.`{f}`",
                    id = ID_FIELD,
                    f = field
                ),
                json!({ "id": id, "by": by }),
            ),
            GraphQuery::SetProperties { id, properties } => CypherStatement::new(
                format!("MATCH (n {{`{}`: $id}}) SET n += $props RETURN n", ID_FIELD),
                json!({ "id": id, "props": properties }),
            ),
            GraphQuery::MatchRelated {
                id,
                rel_type,
                direction,
                label,
            } => {
                let other = match label {
                    Some(label) => format!("(m:`{}`)", label),
                    None => "(m)".to_string(),
                };
                let pattern = match direction {
                    MatchDirection::Outgoing => {
                        format!("(n {{`{}`: $id}})-[r:`{}`]->{}", ID_FIELD, rel_type, other)
                    }
                    MatchDirection::Incoming => {
                        format!("(n {{`{}`: $id}})<-[r:`{}`]-{}", ID_FIELD, rel_type, other)
                    }
                };
                CypherStatement::new(
                    format!("MATCH {} RETURN r, m", pattern),
                    json!({ "id": id }),
                )
            }
        }
    }
}

/// Rows returned by a statement
///
/// `MatchRelated` returns `relationships[i]` paired with `nodes[i]`;
/// `IncrementProperty` returns the new value in `value`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub nodes: Vec<Node>,
    pub relationships: Vec<Relationship>,
    pub value: Option<Value>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_node(node: Node) -> Self {
        Self {
            nodes: vec![node],
            ..Self::default()
        }
    }

    pub fn from_relationships(relationships: Vec<Relationship>) -> Self {
        Self {
            relationships,
            ..Self::default()
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// First node of the result, if any
    pub fn into_first_node(self) -> Option<Node> {
        self.nodes.into_iter().next()
    }

    /// First relationship of the result, if any
    pub fn into_first_relationship(self) -> Option<Relationship> {
        self.relationships.into_iter().next()
    }
}
