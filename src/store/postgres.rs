//! PostgreSQL-backed store. One statement per operation against a shared pool.

use crate::config::{FieldDescriptor, FieldKind, FieldType, ModelDescriptor, PK_FIELD};
use crate::error::StoreError;
use crate::sql::{bind_all, delete, insert, select_all, select_by_id, update, QueryBuf};
use crate::store::{ModelStore, Record};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_optional(&self, q: QueryBuf) -> Result<Option<PgRow>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let query = bind_all(sqlx::query(&q.sql), q.params);
        Ok(query.fetch_optional(&self.pool).await?)
    }
}

#[async_trait]
impl ModelStore for PgStore {
    async fn get(&self, model: &ModelDescriptor, id: i64) -> Result<Option<Record>, StoreError> {
        let sql = select_by_id(model);
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| row_to_record(model, &r)).transpose()
    }

    async fn list(&self, model: &ModelDescriptor) -> Result<Vec<Record>, StoreError> {
        let sql = select_all(model);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_record(model, r)).collect()
    }

    async fn create(&self, model: &ModelDescriptor, values: &Record) -> Result<Record, StoreError> {
        let q = insert(model, values)?;
        let row = match self.fetch_optional(q).await {
            Err(StoreError::Db(sqlx::Error::Database(db))) if db.is_unique_violation() => {
                if let Some(id) = values.get(PK_FIELD).and_then(Value::as_i64) {
                    return Err(StoreError::DuplicateId {
                        model: model.name.clone(),
                        id,
                    });
                }
                return Err(StoreError::Db(sqlx::Error::Database(db)));
            }
            other => other?,
        }
        .ok_or_else(|| StoreError::MissingRow(format!("{} insert", model.name)))?;
        row_to_record(model, &row)
    }

    async fn update(&self, model: &ModelDescriptor, id: i64, values: &Record) -> Result<(), StoreError> {
        let q = update(model, id, values)?;
        self.fetch_optional(q)
            .await?
            .map(|_| ())
            .ok_or_else(|| StoreError::MissingRow(format!("{} {}", model.name, id)))
    }

    async fn delete(&self, model: &ModelDescriptor, id: i64) -> Result<(), StoreError> {
        let sql = delete(model);
        tracing::debug!(sql = %sql, id, "query");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| StoreError::MissingRow(format!("{} {}", model.name, id)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

fn row_to_record(model: &ModelDescriptor, row: &PgRow) -> Result<Record, StoreError> {
    let mut map = Record::new();
    for f in &model.fields {
        map.insert(f.name.clone(), cell_to_value(row, f)?);
    }
    Ok(map)
}

/// Decode one column by the field's declared kind.
fn cell_to_value(row: &PgRow, field: &FieldDescriptor) -> Result<Value, StoreError> {
    use sqlx::Row;
    let name = field.name.as_str();
    let v = match &field.kind {
        FieldKind::Plain(FieldType::Integer) | FieldKind::Single { .. } => {
            row.try_get::<Option<i64>, _>(name)?.map(Value::from)
        }
        FieldKind::Plain(FieldType::Float) => row
            .try_get::<Option<f64>, _>(name)?
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldKind::Plain(FieldType::Text) => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        FieldKind::Plain(FieldType::Boolean) => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        FieldKind::Plain(FieldType::Date) => row
            .try_get::<Option<chrono::NaiveDate>, _>(name)?
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        FieldKind::Plain(FieldType::Datetime) => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)?
            .map(|d| Value::String(d.to_rfc3339())),
        FieldKind::Plain(FieldType::Uuid) => row
            .try_get::<Option<uuid::Uuid>, _>(name)?
            .map(|u| Value::String(u.to_string())),
        FieldKind::Plain(FieldType::Json) => row.try_get::<Option<Value>, _>(name)?,
        FieldKind::Multi { .. } => row
            .try_get::<Option<Vec<i64>>, _>(name)?
            .map(|ids| Value::Array(ids.into_iter().map(Value::from).collect())),
    };
    Ok(v.unwrap_or(Value::Null))
}
