//! Field classification for a model: plain, single-relation and multi-relation,
//! with every relation bound to its related descriptor.

use crate::config::{FieldKind, ModelDescriptor, ModelRegistry};
use crate::error::ConfigError;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ModelIntrospection {
    pub model: Arc<ModelDescriptor>,
    pub plain: Vec<String>,
    pub single: BTreeMap<String, Arc<ModelDescriptor>>,
    pub multi: BTreeMap<String, Arc<ModelDescriptor>>,
}

impl ModelIntrospection {
    /// Related models are looked up in the model's own app label.
    pub fn new(model: Arc<ModelDescriptor>, registry: &ModelRegistry) -> Result<Self, ConfigError> {
        let mut plain = Vec::new();
        let mut single = BTreeMap::new();
        let mut multi = BTreeMap::new();
        for f in &model.fields {
            match &f.kind {
                FieldKind::Plain(_) => plain.push(f.name.clone()),
                FieldKind::Single { related } => {
                    single.insert(f.name.clone(), Self::related(&model, related, registry)?);
                }
                FieldKind::Multi { related } => {
                    multi.insert(f.name.clone(), Self::related(&model, related, registry)?);
                }
            }
        }
        Ok(ModelIntrospection {
            model,
            plain,
            single,
            multi,
        })
    }

    /// Self-references resolve to the model itself even before it is registered.
    fn related(
        model: &Arc<ModelDescriptor>,
        related: &str,
        registry: &ModelRegistry,
    ) -> Result<Arc<ModelDescriptor>, ConfigError> {
        if related == model.name {
            return Ok(model.clone());
        }
        registry.get(&model.app_label, related)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve};

    #[test]
    fn partitions_fields_by_relation_kind() {
        let registry = resolve(
            &load_from_str(
                r#"{"models": [
                    {"app_label": "t", "name": "ChildModel", "fields": [{"name": "name", "type": "text"}]},
                    {"app_label": "t", "name": "Parent", "fields": [
                        {"name": "dummy", "relation": {"kind": "foreign_key", "to": "ChildModel"}},
                        {"name": "children", "relation": {"kind": "many_to_many", "to": "ChildModel"}},
                        {"name": "label", "type": "text"}
                    ]}
                ]}"#,
            )
            .unwrap(),
        )
        .unwrap();
        let parent = registry.get("t", "Parent").unwrap();
        let intro = ModelIntrospection::new(parent, &registry).unwrap();
        assert_eq!(intro.plain, ["id", "label"]);
        assert_eq!(intro.single["dummy"].name, "ChildModel");
        assert_eq!(intro.multi["children"].name, "ChildModel");
        assert!(!intro.single.contains_key("label"));
    }
}
