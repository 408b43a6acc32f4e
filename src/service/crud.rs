//! Record operations for one model against a ModelStore.
//! Relation ids in a payload are checked against the related model before any write.

use crate::config::ModelDescriptor;
use crate::error::AppError;
use crate::introspect::ModelIntrospection;
use crate::response::{object_missing, related_missing_on_create, related_missing_on_update};
use crate::store::{ModelStore, Record};
use serde_json::Value;

pub struct CrudService;

impl CrudService {
    /// Fetch one record; absent records are a 404.
    pub async fn read(store: &dyn ModelStore, model: &ModelDescriptor, id: i64) -> Result<Record, AppError> {
        store
            .get(model, id)
            .await?
            .ok_or_else(|| AppError::NotFound(object_missing(&model.name)))
    }

    pub async fn list(store: &dyn ModelStore, model: &ModelDescriptor) -> Result<Vec<Record>, AppError> {
        Ok(store.list(model).await?)
    }

    /// Create from decoded payload. A missing related record is a 400.
    pub async fn create(
        store: &dyn ModelStore,
        introspection: &ModelIntrospection,
        payload: Record,
    ) -> Result<Record, AppError> {
        Self::check_relations(store, introspection, &payload, |related, field| {
            AppError::BadRequest(related_missing_on_create(related, field))
        })
        .await?;
        let created = store.create(&introspection.model, &payload).await?;
        tracing::debug!(model = %introspection.model.name, id = ?created.get("id"), "created");
        Ok(created)
    }

    /// Write the supplied fields of an existing record, then read it back.
    /// Shared by full and partial updates; a missing related record is a 404.
    pub async fn update(
        store: &dyn ModelStore,
        introspection: &ModelIntrospection,
        id: i64,
        payload: Record,
    ) -> Result<Record, AppError> {
        let model = &introspection.model;
        Self::read(store, model, id).await?;
        Self::check_relations(store, introspection, &payload, |related, field| {
            AppError::NotFound(related_missing_on_update(related, field))
        })
        .await?;
        store.update(model, id, &payload).await?;
        Self::read(store, model, id).await
    }

    pub async fn delete(store: &dyn ModelStore, model: &ModelDescriptor, id: i64) -> Result<(), AppError> {
        Self::read(store, model, id).await?;
        store.delete(model, id).await?;
        tracing::debug!(model = %model.name, id, "deleted");
        Ok(())
    }

    /// Walk relation fields in model order; first missing target wins.
    /// Null is assigned as-is.
    async fn check_relations<F>(
        store: &dyn ModelStore,
        introspection: &ModelIntrospection,
        payload: &Record,
        on_missing: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&str, &str) -> AppError,
    {
        for field in &introspection.model.fields {
            let Some(value) = payload.get(&field.name) else {
                continue;
            };
            if let Some(related) = introspection.single.get(&field.name) {
                if value.is_null() {
                    continue;
                }
                let id = relation_id(&field.name, value)?;
                if store.get(related, id).await?.is_none() {
                    return Err(on_missing(&related.name, &field.name));
                }
            } else if let Some(related) = introspection.multi.get(&field.name) {
                let ids = match value {
                    Value::Null => continue,
                    Value::Array(items) => items,
                    _ => {
                        return Err(AppError::Validation(format!(
                            "{}: expected array of integer ids",
                            field.name
                        )))
                    }
                };
                for item in ids {
                    let id = relation_id(&field.name, item)?;
                    if store.get(related, id).await?.is_none() {
                        return Err(on_missing(&related.name, &field.name));
                    }
                }
            }
        }
        Ok(())
    }
}

fn relation_id(field: &str, value: &Value) -> Result<i64, AppError> {
    value
        .as_i64()
        .ok_or_else(|| AppError::Validation(format!("{}: expected integer id", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve, ModelRegistry};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn registry() -> ModelRegistry {
        resolve(
            &load_from_str(
                r#"{"models": [
                    {"app_label": "tests", "name": "ChildModel", "fields": [
                        {"name": "count", "type": "integer"}, {"name": "name", "type": "text"}]},
                    {"app_label": "tests", "name": "ForeignKeyParentModel", "fields": [
                        {"name": "dummy", "relation": {"kind": "foreign_key", "to": "ChildModel"}}]},
                    {"app_label": "tests", "name": "ManyToManyParentModel", "fields": [
                        {"name": "children", "relation": {"kind": "many_to_many", "to": "ChildModel"}}]}
                ]}"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    fn record(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    fn intro(registry: &ModelRegistry, name: &str) -> ModelIntrospection {
        ModelIntrospection::new(registry.get("tests", name).unwrap(), registry).unwrap()
    }

    #[tokio::test]
    async fn missing_fk_target_is_400_on_create_and_404_on_update() {
        let registry = registry();
        let store = MemoryStore::new();
        let child = intro(&registry, "ChildModel");
        let parent = intro(&registry, "ForeignKeyParentModel");

        let err = CrudService::create(&store, &parent, record(json!({"dummy": 5})))
            .await
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 400);
        assert_eq!(
            err.to_string(),
            "ChildModel referenced by 'dummy_id' does not exist!"
        );

        CrudService::create(&store, &child, record(json!({"count": 1, "name": "a"})))
            .await
            .unwrap();
        let created = CrudService::create(&store, &parent, record(json!({"dummy": 1})))
            .await
            .unwrap();
        let id = created["id"].as_i64().unwrap();

        let err = CrudService::update(&store, &parent, id, record(json!({"dummy": 7})))
            .await
            .unwrap_err();
        assert_eq!(err.status().as_u16(), 404);
        assert_eq!(err.to_string(), "ChildModel referenced by 'dummy_id' does not exist");
    }

    #[tokio::test]
    async fn many_to_many_ids_are_each_checked() {
        let registry = registry();
        let store = MemoryStore::new();
        let child = intro(&registry, "ChildModel");
        let parent = intro(&registry, "ManyToManyParentModel");
        CrudService::create(&store, &child, record(json!({"count": 1, "name": "a"})))
            .await
            .unwrap();

        let ok = CrudService::create(&store, &parent, record(json!({"children": [1]})))
            .await
            .unwrap();
        assert_eq!(ok["children"], json!([1]));

        let err = CrudService::create(&store, &parent, record(json!({"children": [1, 2]})))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "ChildModel referenced by 'children_id' does not exist!"
        );
    }

    #[tokio::test]
    async fn update_reads_back_and_missing_record_is_404() {
        let registry = registry();
        let store = MemoryStore::new();
        let child = intro(&registry, "ChildModel");
        CrudService::create(&store, &child, record(json!({"count": 1, "name": "a"})))
            .await
            .unwrap();
        let updated = CrudService::update(&store, &child, 1, record(json!({"name": "b"})))
            .await
            .unwrap();
        assert_eq!(Value::Object(updated), json!({"id": 1, "count": 1, "name": "b"}));

        let err = CrudService::update(&store, &child, 9, record(json!({"name": "b"})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Requested ChildModel object does not exist");
        let err = CrudService::delete(&store, &child.model, 9).await.unwrap_err();
        assert_eq!(err.status().as_u16(), 404);
    }
}
