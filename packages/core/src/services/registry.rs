//! Model Registry
//!
//! Models are registered once at startup and looked up by name for every
//! operation. Registration validates labels and field names up front so
//! that every later query template is built from known-safe identifiers.
//!
//! ```rust
//! use nodegraph_core::models::{FieldType, ModelSchema};
//! use nodegraph_core::services::ModelRegistry;
//!
//! let registry = ModelRegistry::builder()
//!     .register("User", ModelSchema::new().field("first", FieldType::String))
//!     .unwrap()
//!     .build();
//! assert_eq!(registry.get("User").unwrap().label, "User");
//! ```

use crate::models::{ensure_identifier, ModelSchema, ValidationError};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A registered model: a name, the label its nodes carry, and its schema
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    pub name: String,
    pub label: String,
    pub schema: ModelSchema,
}

/// Collects model definitions before freezing them into a `ModelRegistry`
#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    models: IndexMap<String, Arc<ModelDefinition>>,
}

impl ModelRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model whose label equals its name
    pub fn register(
        self,
        name: impl Into<String>,
        schema: ModelSchema,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let label = name.clone();
        self.register_with_label(name, label, schema)
    }

    /// Register a model stored under a different label
    pub fn register_with_label(
        mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        schema: ModelSchema,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let label = label.into();

        if name.trim().is_empty() {
            return Err(ValidationError::required("model name"));
        }
        ensure_identifier("model label", &label)?;
        schema.validate()?;

        if self.models.contains_key(&name) {
            return Err(ValidationError::DuplicateModel(name));
        }

        self.models.insert(
            name.clone(),
            Arc::new(ModelDefinition {
                name,
                label,
                schema,
            }),
        );
        Ok(self)
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            models: self.models,
        }
    }
}

/// Immutable name -> definition lookup shared by all services
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, Arc<ModelDefinition>>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::new()
    }

    /// Look up a model by name
    pub fn get(&self, name: &str) -> Result<Arc<ModelDefinition>, ValidationError> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownModel(name.to_string()))
    }

    /// Coerce raw input for a new entity of `name` through its schema
    pub fn coerce(
        &self,
        name: &str,
        raw: Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationError> {
        self.get(name)?.schema.coerce(raw)
    }

    /// Registered model names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldType;
    use serde_json::json;

    #[test]
    fn test_register_and_get() {
        let registry = ModelRegistry::builder()
            .register("User", ModelSchema::new().field("first", FieldType::String))
            .unwrap()
            .register_with_label("Team", "Schedule", ModelSchema::new())
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Team").unwrap().label, "Schedule");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["User", "Team"]);
    }

    #[test]
    fn test_unknown_model() {
        let registry = ModelRegistry::default();
        assert_eq!(
            registry.get("Ghost").unwrap_err(),
            ValidationError::UnknownModel("Ghost".to_string())
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let err = ModelRegistry::builder()
            .register("User", ModelSchema::new())
            .unwrap()
            .register("User", ModelSchema::new())
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateModel("User".to_string()));
    }

    #[test]
    fn test_invalid_label_rejected() {
        let err = ModelRegistry::builder()
            .register("Bad Label", ModelSchema::new())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_coerce_through_registry() {
        let registry = ModelRegistry::builder()
            .register("User", ModelSchema::new().field("first", FieldType::String))
            .unwrap()
            .build();
        let raw = json!({"first": "John", "extra": 1});
        let coerced = registry
            .coerce("User", raw.as_object().cloned().unwrap())
            .unwrap();
        assert_eq!(coerced.len(), 1);
    }
}
