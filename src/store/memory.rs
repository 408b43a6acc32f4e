//! In-process store keyed by model. Used by tests and the demo server without a database.

use crate::config::{ModelDescriptor, PK_FIELD};
use crate::error::StoreError;
use crate::store::{ModelStore, Record};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Record>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<(String, String), Table>>,
}

fn table_key(model: &ModelDescriptor) -> (String, String) {
    (model.app_label.clone(), model.name.clone())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModelStore for MemoryStore {
    async fn get(&self, model: &ModelDescriptor, id: i64) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables
            .get(&table_key(model))
            .and_then(|t| t.rows.get(&id))
            .cloned())
    }

    async fn list(&self, model: &ModelDescriptor) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables
            .get(&table_key(model))
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn create(&self, model: &ModelDescriptor, values: &Record) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let table = tables.entry(table_key(model)).or_default();
        let id = match values.get(PK_FIELD).and_then(Value::as_i64) {
            Some(id) => id,
            None => table.last_id + 1,
        };
        if table.rows.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                model: model.name.clone(),
                id,
            });
        }
        table.last_id = table.last_id.max(id);

        let mut record = Record::new();
        for f in &model.fields {
            let v = if f.primary_key {
                Value::from(id)
            } else {
                values.get(&f.name).cloned().unwrap_or(Value::Null)
            };
            record.insert(f.name.clone(), v);
        }
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, model: &ModelDescriptor, id: i64, values: &Record) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let row = tables
            .get_mut(&table_key(model))
            .and_then(|t| t.rows.get_mut(&id))
            .ok_or_else(|| StoreError::MissingRow(format!("{} {}", model.name, id)))?;
        for f in model.writable_fields() {
            if let Some(v) = values.get(&f.name) {
                row.insert(f.name.clone(), v.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, model: &ModelDescriptor, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        tables
            .get_mut(&table_key(model))
            .and_then(|t| t.rows.remove(&id))
            .map(|_| ())
            .ok_or_else(|| StoreError::MissingRow(format!("{} {}", model.name, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve};
    use serde_json::json;

    fn child() -> std::sync::Arc<ModelDescriptor> {
        let registry = resolve(
            &load_from_str(
                r#"{"models": [{"app_label": "t", "name": "ChildModel", "fields": [
                    {"name": "count", "type": "integer"}, {"name": "name", "type": "text"}]}]}"#,
            )
            .unwrap(),
        )
        .unwrap();
        registry.get("t", "ChildModel").unwrap()
    }

    #[tokio::test]
    async fn assigns_sequential_ids_and_fills_missing_fields() {
        let store = MemoryStore::new();
        let model = child();
        let mut values = Record::new();
        values.insert("count".into(), json!(1));
        let first = store.create(&model, &values).await.unwrap();
        let second = store.create(&model, &values).await.unwrap();
        assert_eq!(Value::Object(first), json!({"id": 1, "count": 1, "name": null}));
        assert_eq!(second["id"], json!(2));
        assert_eq!(store.list(&model).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn explicit_id_must_be_unused() {
        let store = MemoryStore::new();
        let model = child();
        let mut values = Record::new();
        values.insert("id".into(), json!(1));
        values.insert("name".into(), json!("a"));
        store.create(&model, &values).await.unwrap();

        values.insert("name".into(), json!("b"));
        assert!(matches!(
            store.create(&model, &values).await,
            Err(StoreError::DuplicateId { id: 1, .. })
        ));
        let row = store.get(&model, 1).await.unwrap().unwrap();
        assert_eq!(row["name"], json!("a"));

        let next = store.create(&model, &Record::new()).await.unwrap();
        assert_eq!(next["id"], json!(2));
    }

    #[tokio::test]
    async fn update_touches_only_supplied_fields() {
        let store = MemoryStore::new();
        let model = child();
        let mut values = Record::new();
        values.insert("count".into(), json!(1));
        values.insert("name".into(), json!("a"));
        store.create(&model, &values).await.unwrap();

        let mut patch = Record::new();
        patch.insert("name".into(), json!("b"));
        store.update(&model, 1, &patch).await.unwrap();
        let row = store.get(&model, 1).await.unwrap().unwrap();
        assert_eq!(Value::Object(row), json!({"id": 1, "count": 1, "name": "b"}));

        assert!(matches!(
            store.update(&model, 9, &patch).await,
            Err(StoreError::MissingRow(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = MemoryStore::new();
        let model = child();
        store.create(&model, &Record::new()).await.unwrap();
        store.delete(&model, 1).await.unwrap();
        assert!(store.get(&model, 1).await.unwrap().is_none());
        assert!(store.delete(&model, 1).await.is_err());
    }
}
