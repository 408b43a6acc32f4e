//! Convert decoded JSON values to typed values sqlx can bind, driven by the field's declared kind.

use crate::config::{FieldDescriptor, FieldKind, FieldType};
use crate::error::StoreError;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A value that can be bound to a PostgreSQL query. Nulls keep their column type.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    I64(Option<i64>),
    F64(Option<f64>),
    String(Option<String>),
    Bool(Option<bool>),
    Date(Option<chrono::NaiveDate>),
    Datetime(Option<chrono::DateTime<chrono::Utc>>),
    Uuid(Option<uuid::Uuid>),
    Json(Value),
    I64Array(Option<Vec<i64>>),
}

impl PgBindValue {
    pub fn from_json(field: &FieldDescriptor, v: &Value) -> Result<Self, StoreError> {
        let bad = |reason: &str| StoreError::Value {
            field: field.name.clone(),
            reason: reason.to_string(),
        };
        let is_null = v.is_null();
        Ok(match &field.kind {
            FieldKind::Plain(FieldType::Integer) | FieldKind::Single { .. } => PgBindValue::I64(
                if is_null { None } else { Some(v.as_i64().ok_or_else(|| bad("expected integer"))?) },
            ),
            FieldKind::Plain(FieldType::Float) => PgBindValue::F64(
                if is_null { None } else { Some(v.as_f64().ok_or_else(|| bad("expected number"))?) },
            ),
            FieldKind::Plain(FieldType::Text) => PgBindValue::String(if is_null {
                None
            } else {
                Some(v.as_str().ok_or_else(|| bad("expected string"))?.to_string())
            }),
            FieldKind::Plain(FieldType::Boolean) => PgBindValue::Bool(
                if is_null { None } else { Some(v.as_bool().ok_or_else(|| bad("expected boolean"))?) },
            ),
            FieldKind::Plain(FieldType::Date) => PgBindValue::Date(if is_null {
                None
            } else {
                let s = v.as_str().ok_or_else(|| bad("expected date string"))?;
                Some(chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| bad(&e.to_string()))?)
            }),
            FieldKind::Plain(FieldType::Datetime) => PgBindValue::Datetime(if is_null {
                None
            } else {
                let s = v.as_str().ok_or_else(|| bad("expected datetime string"))?;
                let dt = chrono::DateTime::parse_from_rfc3339(s).map_err(|e| bad(&e.to_string()))?;
                Some(dt.with_timezone(&chrono::Utc))
            }),
            FieldKind::Plain(FieldType::Uuid) => PgBindValue::Uuid(if is_null {
                None
            } else {
                let s = v.as_str().ok_or_else(|| bad("expected uuid string"))?;
                Some(uuid::Uuid::parse_str(s).map_err(|e| bad(&e.to_string()))?)
            }),
            FieldKind::Plain(FieldType::Json) => PgBindValue::Json(v.clone()),
            FieldKind::Multi { .. } => PgBindValue::I64Array(if is_null {
                None
            } else {
                let items = v.as_array().ok_or_else(|| bad("expected list of ids"))?;
                Some(
                    items
                        .iter()
                        .map(|i| i.as_i64().ok_or_else(|| bad("expected integer id")))
                        .collect::<Result<Vec<_>, _>>()?,
                )
            }),
        })
    }
}

/// Bind every parameter in order.
pub fn bind_all<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: Vec<PgBindValue>,
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p {
            PgBindValue::I64(v) => query.bind(v),
            PgBindValue::F64(v) => query.bind(v),
            PgBindValue::String(v) => query.bind(v),
            PgBindValue::Bool(v) => query.bind(v),
            PgBindValue::Date(v) => query.bind(v),
            PgBindValue::Datetime(v) => query.bind(v),
            PgBindValue::Uuid(v) => query.bind(v),
            PgBindValue::Json(v) => query.bind(v),
            PgBindValue::I64Array(v) => query.bind(v),
        };
    }
    query
}
