//! Load config from JSON and resolve it into a model registry.

use crate::case::to_snake_case;
use crate::config::resolved::{FieldDescriptor, FieldKind, ModelDescriptor, ModelRegistry, PK_FIELD};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::path::Path;

const DEFAULT_DB_SCHEMA: &str = "public";

/// Build the registry from full config (validates first).
pub fn resolve(config: &FullConfig) -> Result<ModelRegistry, ConfigError> {
    validate(config)?;
    let mut registry = ModelRegistry::new();
    for m in &config.models {
        registry.register(resolve_model(m))?;
    }
    tracing::debug!(models = registry.models().len(), "resolved model registry");
    Ok(registry)
}

fn resolve_model(m: &ModelConfig) -> ModelDescriptor {
    let mut fields: Vec<FieldDescriptor> = m.fields.iter().map(resolve_field).collect();
    // Models without a declared key get the implicit auto id.
    if !fields.iter().any(|f| f.primary_key) {
        fields.insert(
            0,
            FieldDescriptor {
                name: PK_FIELD.into(),
                kind: FieldKind::Plain(FieldType::Integer),
                nullable: false,
                primary_key: true,
            },
        );
    }
    ModelDescriptor {
        app_label: m.app_label.clone(),
        name: m.name.clone(),
        verbose_name_plural: m
            .verbose_name_plural
            .clone()
            .unwrap_or_else(|| format!("{}s", m.name.to_lowercase())),
        db_schema: m.db_schema.clone().unwrap_or_else(|| DEFAULT_DB_SCHEMA.into()),
        db_table: m.db_table.clone().unwrap_or_else(|| to_snake_case(&m.name)),
        fields,
    }
}

fn resolve_field(f: &FieldConfig) -> FieldDescriptor {
    let kind = match &f.relation {
        Some(rel) => match rel.kind {
            RelationKind::ForeignKey | RelationKind::OneToOne => FieldKind::Single {
                related: rel.to.clone(),
            },
            RelationKind::ManyToMany => FieldKind::Multi {
                related: rel.to.clone(),
            },
        },
        // validate() guarantees plain fields carry a type
        None => FieldKind::Plain(f.type_.unwrap_or(FieldType::Json)),
    };
    FieldDescriptor {
        name: f.name.clone(),
        kind,
        nullable: f.nullable,
        primary_key: f.primary_key,
    }
}

pub fn load_from_str(json: &str) -> Result<FullConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read a `{"models": [...], "routers": [...]}` JSON file.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<FullConfig, ConfigError> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading model config");
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    load_from_str(&raw)
}
