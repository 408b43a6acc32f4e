//! Create tables for registered models: schemas, tables, then foreign keys.
//! Idempotent (IF NOT EXISTS); foreign keys that already exist are skipped, any
//! other failure is returned.

use crate::config::{FieldDescriptor, FieldKind, FieldType, ModelDescriptor, ModelRegistry, PK_FIELD};
use crate::error::StoreError;
use crate::sql::builder::{qualified_table, quoted};
use sqlx::PgPool;
use std::collections::BTreeSet;

pub async fn apply_migrations(pool: &PgPool, registry: &ModelRegistry) -> Result<(), StoreError> {
    let schemas: BTreeSet<&str> = registry.models().iter().map(|m| m.db_schema.as_str()).collect();
    for s in schemas {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(s));
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(pool).await?;
    }

    for m in registry.models() {
        let sql = create_table(m);
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(pool).await?;
    }

    for m in registry.models() {
        for f in &m.fields {
            let FieldKind::Single { related } = &f.kind else {
                continue;
            };
            let target = registry.get(&m.app_label, related).map_err(|e| StoreError::Value {
                field: f.name.clone(),
                reason: e.to_string(),
            })?;
            let sql = format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
                qualified_table(m),
                quoted(&format!("{}_{}_fkey", m.db_table, f.name)),
                quoted(&f.name),
                qualified_table(&target),
                quoted(PK_FIELD)
            );
            tracing::debug!(sql = %sql, "migration");
            match sqlx::query(&sql).execute(pool).await {
                Ok(_) => {}
                Err(e) if is_duplicate_object(sqlstate(&e).as_deref()) => {
                    tracing::debug!(constraint = %f.name, model = %m.name, "foreign key exists");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    tracing::info!(models = registry.models().len(), "migrations applied");
    Ok(())
}

/// SQLSTATE `duplicate_object`.
const DUPLICATE_OBJECT: &str = "42710";

fn sqlstate(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn is_duplicate_object(code: Option<&str>) -> bool {
    code == Some(DUPLICATE_OBJECT)
}

fn create_table(m: &ModelDescriptor) -> String {
    let cols: Vec<String> = m.fields.iter().map(column_def).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(m),
        cols.join(",\n  ")
    )
}

fn column_def(f: &FieldDescriptor) -> String {
    if f.primary_key {
        return format!("{} BIGSERIAL PRIMARY KEY", quoted(&f.name));
    }
    let ty = match &f.kind {
        FieldKind::Plain(FieldType::Integer) | FieldKind::Single { .. } => "BIGINT",
        FieldKind::Plain(FieldType::Float) => "DOUBLE PRECISION",
        FieldKind::Plain(FieldType::Text) => "TEXT",
        FieldKind::Plain(FieldType::Boolean) => "BOOLEAN",
        FieldKind::Plain(FieldType::Date) => "DATE",
        FieldKind::Plain(FieldType::Datetime) => "TIMESTAMPTZ",
        FieldKind::Plain(FieldType::Uuid) => "UUID",
        FieldKind::Plain(FieldType::Json) => "JSONB",
        FieldKind::Multi { .. } => "BIGINT[] DEFAULT '{}'",
    };
    let mut def = format!("{} {}", quoted(&f.name), ty);
    if !f.nullable {
        def.push_str(" NOT NULL");
    }
    def
}
