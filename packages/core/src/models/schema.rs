//! Model Schema Types
//!
//! A model schema maps field names to typed field definitions with optional
//! defaults, plus a strictness flag:
//!
//! - `strict = true`: unknown fields are dropped during coercion
//! - `strict = false`: unknown fields pass through untouched
//!
//! ## Example
//!
//! ```rust
//! use nodegraph_core::models::{FieldDefinition, FieldType, ModelSchema};
//! use serde_json::json;
//!
//! let schema = ModelSchema::new()
//!     .field("first", FieldType::String)
//!     .field("countSchedules", FieldType::Number)
//!     .field_def(
//!         "countActivities",
//!         FieldDefinition::new(FieldType::Number).with_default(json!(0)),
//!     );
//! assert!(schema.is_strict());
//! ```

use crate::models::node::{is_valid_identifier, ValidationError, ID_FIELD};
use chrono::DateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Declared type of a model field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// RFC 3339 timestamp stored as a string
    Date,
    Array,
    Object,
    /// No coercion
    Any,
}

impl FieldType {
    fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Any => "any",
        }
    }

    /// Coerce a raw value to this type, returning `None` when impossible
    fn coerce(self, value: Value) -> Option<Value> {
        if value.is_null() {
            return Some(value);
        }

        match (self, value) {
            (FieldType::Any, v) => Some(v),
            (FieldType::String, Value::String(s)) => Some(Value::String(s)),
            (FieldType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (FieldType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            (FieldType::Number, Value::Number(n)) => Some(Value::Number(n)),
            (FieldType::Number, Value::String(s)) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Some(Value::Number(i.into()))
                } else {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .map(Value::Number)
                }
            }
            (FieldType::Boolean, Value::Bool(b)) => Some(Value::Bool(b)),
            (FieldType::Boolean, Value::String(s)) => match s.as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (FieldType::Date, Value::String(s)) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| Value::String(dt.to_rfc3339())),
            (FieldType::Array, v @ Value::Array(_)) => Some(v),
            (FieldType::Object, v @ Value::Object(_)) => Some(v),
            _ => None,
        }
    }
}

/// Definition of a single model field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Value applied when the field is absent from the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Whether the field must be present (after defaults are applied)
    #[serde(default)]
    pub required: bool,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            default: None,
            required: false,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

fn default_strict() -> bool {
    true
}

/// Field definitions and strictness for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub fields: IndexMap<String, FieldDefinition>,

    #[serde(default = "default_strict")]
    pub strict: bool,
}

impl Default for ModelSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelSchema {
    /// Create an empty strict schema
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            strict: true,
        }
    }

    /// Add a field with no default
    pub fn field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field_def(name, FieldDefinition::new(field_type))
    }

    /// Add a fully specified field
    pub fn field_def(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.insert(name.into(), definition);
        self
    }

    /// Set strictness (unknown fields dropped when `true`)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Get a field definition by name
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Check field names are usable as property keys in query templates
    pub fn validate(&self) -> Result<(), ValidationError> {
        for name in self.fields.keys() {
            if !is_valid_identifier(name) || name == ID_FIELD {
                return Err(ValidationError::invalid_identifier("schema field", name));
            }
        }
        Ok(())
    }

    /// Validate and coerce raw input properties for a new entity
    ///
    /// - Declared fields are coerced to their type
    /// - Unknown fields are dropped (strict) or passed through (non-strict)
    /// - `_id` is reserved and always dropped; the store assigns it
    /// - Defaults fill absent fields, then `required` is enforced
    pub fn coerce(&self, raw: Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
        let mut coerced = self.coerce_partial(raw)?;

        for (name, definition) in &self.fields {
            if coerced.contains_key(name) {
                continue;
            }
            if let Some(default) = &definition.default {
                coerced.insert(name.clone(), default.clone());
            } else if definition.required {
                return Err(ValidationError::required(name.clone()));
            }
        }

        Ok(coerced)
    }

    /// Coerce only the provided fields (property updates): no defaults, no
    /// `required` check
    pub fn coerce_partial(
        &self,
        raw: Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationError> {
        let mut coerced = Map::new();

        for (name, value) in raw {
            if name == ID_FIELD {
                continue;
            }
            match self.fields.get(&name) {
                Some(definition) => {
                    let field_type = definition.field_type;
                    let converted = field_type.coerce(value.clone()).ok_or_else(|| {
                        ValidationError::InvalidValue {
                            field: name.clone(),
                            expected: field_type.name().to_string(),
                            value,
                        }
                    })?;
                    coerced.insert(name, converted);
                }
                None if !self.strict => {
                    coerced.insert(name, value);
                }
                None => {}
            }
        }

        Ok(coerced)
    }
}
