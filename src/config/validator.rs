//! Config validation: identifiers, primary keys and referential integrity.

use crate::config::{FieldType, FullConfig, ModelConfig, PK_FIELD};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";
const PATH_SEGMENT_PATTERN: &str = r"^[A-Za-z0-9_\-]+$";

pub fn validate(config: &FullConfig) -> Result<(), ConfigError> {
    let ident = Regex::new(IDENTIFIER_PATTERN).map_err(|e| ConfigError::Load(e.to_string()))?;
    let segment = Regex::new(PATH_SEGMENT_PATTERN).map_err(|e| ConfigError::Load(e.to_string()))?;

    let mut model_keys = HashSet::new();
    for m in &config.models {
        for name in [m.app_label.as_str(), m.name.as_str()] {
            check_identifier(&ident, name)?;
        }
        for name in [m.db_schema.as_deref(), m.db_table.as_deref()].into_iter().flatten() {
            check_identifier(&ident, name)?;
        }
        if let Some(plural) = &m.verbose_name_plural {
            if !segment.is_match(plural) {
                return Err(ConfigError::InvalidIdentifier(plural.clone()));
            }
        }
        if !model_keys.insert((m.app_label.as_str(), m.name.as_str())) {
            return Err(ConfigError::DuplicateModel(format!("{}.{}", m.app_label, m.name)));
        }
        validate_fields(&ident, m)?;
    }

    for m in &config.models {
        for f in &m.fields {
            if let Some(rel) = &f.relation {
                if !model_keys.contains(&(m.app_label.as_str(), rel.to.as_str())) {
                    return Err(ConfigError::ModelNotFound {
                        app_label: m.app_label.clone(),
                        model: rel.to.clone(),
                    });
                }
            }
        }
    }

    for r in &config.routers {
        if !model_keys.contains(&(r.app_label.as_str(), r.model.as_str())) {
            return Err(ConfigError::ModelNotFound {
                app_label: r.app_label.clone(),
                model: r.model.clone(),
            });
        }
    }

    Ok(())
}

fn check_identifier(ident: &Regex, name: &str) -> Result<(), ConfigError> {
    if ident.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(name.to_string()))
    }
}

fn validate_fields(ident: &Regex, m: &ModelConfig) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut pk_count = 0;
    for f in &m.fields {
        check_identifier(ident, &f.name)?;
        if !names.insert(f.name.as_str()) {
            return Err(ConfigError::InvalidIdentifier(format!(
                "duplicate field {}.{}",
                m.name, f.name
            )));
        }
        if f.relation.is_none() && f.type_.is_none() {
            return Err(ConfigError::Load(format!(
                "field {}.{} needs a type or a relation",
                m.name, f.name
            )));
        }
        if f.primary_key {
            pk_count += 1;
            let integer = f.relation.is_none() && f.type_ == Some(FieldType::Integer);
            if f.name != PK_FIELD || !integer || f.nullable {
                return Err(ConfigError::InvalidPrimaryKey {
                    model: m.name.clone(),
                    reason: format!("primary key must be a non-null integer named '{}'", PK_FIELD),
                });
            }
        } else if f.name == PK_FIELD {
            return Err(ConfigError::InvalidPrimaryKey {
                model: m.name.clone(),
                reason: format!("field '{}' is reserved for the primary key", PK_FIELD),
            });
        }
    }
    if pk_count > 1 {
        return Err(ConfigError::InvalidPrimaryKey {
            model: m.name.clone(),
            reason: "composite primary keys are not supported".into(),
        });
    }
    Ok(())
}
