//! Resolved model descriptors: config validated and flattened for generation.

use crate::config::FieldType;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the primary key every model carries.
pub const PK_FIELD: &str = "id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Plain(FieldType),
    /// Foreign key or one-to-one: holds the related record's id.
    Single { related: String },
    /// Many-to-many: holds a list of related record ids.
    Multi { related: String },
}

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub nullable: bool,
    pub primary_key: bool,
}

#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    pub app_label: String,
    /// Object name, e.g. `ChildModel`.
    pub name: String,
    pub verbose_name_plural: String,
    pub db_schema: String,
    pub db_table: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn require_field(&self, name: &str) -> Result<&FieldDescriptor, ConfigError> {
        self.field(name).ok_or_else(|| ConfigError::UnknownField {
            model: self.name.clone(),
            field: name.to_string(),
        })
    }

    /// Columns written on insert/update: everything but the primary key.
    pub fn writable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.primary_key)
    }
}

/// Startup-populated lookup of model descriptors by `(app_label, name)`.
#[derive(Clone, Debug, Default)]
pub struct ModelRegistry {
    models: Vec<Arc<ModelDescriptor>>,
    by_key: HashMap<(String, String), Arc<ModelDescriptor>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: ModelDescriptor) -> Result<Arc<ModelDescriptor>, ConfigError> {
        let key = (model.app_label.clone(), model.name.clone());
        if self.by_key.contains_key(&key) {
            return Err(ConfigError::DuplicateModel(format!("{}.{}", key.0, key.1)));
        }
        let model = Arc::new(model);
        self.by_key.insert(key, model.clone());
        self.models.push(model.clone());
        Ok(model)
    }

    /// Exact-match lookup; unregistered names fail with `ModelNotFound`.
    pub fn get(&self, app_label: &str, name: &str) -> Result<Arc<ModelDescriptor>, ConfigError> {
        self.by_key
            .get(&(app_label.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ConfigError::ModelNotFound {
                app_label: app_label.to_string(),
                model: name.to_string(),
            })
    }

    pub fn models(&self) -> &[Arc<ModelDescriptor>] {
        &self.models
    }
}
