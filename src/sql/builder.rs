//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a model descriptor.

use crate::config::{ModelDescriptor, PK_FIELD};
use crate::error::StoreError;
use crate::sql::PgBindValue;
use crate::store::Record;

/// Quote identifier for PostgreSQL (safe: only from validated config).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub(crate) fn qualified_table(model: &ModelDescriptor) -> String {
    format!("{}.{}", quoted(&model.db_schema), quoted(&model.db_table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Every declared column, in model order.
pub fn select_column_list(model: &ModelDescriptor) -> String {
    model
        .fields
        .iter()
        .map(|f| quoted(&f.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key. Caller binds the id as sole param.
pub fn select_by_id(model: &ModelDescriptor) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1",
        select_column_list(model),
        qualified_table(model),
        quoted(PK_FIELD)
    )
}

/// SELECT every row ordered by primary key.
pub fn select_all(model: &ModelDescriptor) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {}",
        select_column_list(model),
        qualified_table(model),
        quoted(PK_FIELD)
    )
}

/// INSERT the supplied columns; the rest take their column defaults. Returns the new row.
pub fn insert(model: &ModelDescriptor, values: &Record) -> Result<QueryBuf, StoreError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in &model.fields {
        if let Some(v) = values.get(&f.name) {
            let n = q.push_param(PgBindValue::from_json(f, v)?);
            cols.push(quoted(&f.name));
            placeholders.push(format!("${}", n));
        }
    }
    let table = qualified_table(model);
    let returning = select_column_list(model);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    Ok(q)
}

/// UPDATE the supplied columns of one row. An empty update still touches the row
/// and reports whether it exists. Id is the last param.
pub fn update(model: &ModelDescriptor, id: i64, values: &Record) -> Result<QueryBuf, StoreError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for f in model.writable_fields() {
        if let Some(v) = values.get(&f.name) {
            let n = q.push_param(PgBindValue::from_json(f, v)?);
            sets.push(format!("{} = ${}", quoted(&f.name), n));
        }
    }
    if sets.is_empty() {
        sets.push(format!("{0} = {0}", quoted(PK_FIELD)));
    }
    let n = q.push_param(PgBindValue::I64(Some(id)));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        qualified_table(model),
        sets.join(", "),
        quoted(PK_FIELD),
        n,
        quoted(PK_FIELD)
    );
    Ok(q)
}

/// DELETE by primary key. Caller binds the id as sole param.
pub fn delete(model: &ModelDescriptor) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        qualified_table(model),
        quoted(PK_FIELD),
        quoted(PK_FIELD)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldDescriptor, FieldKind, FieldType};
    use serde_json::json;

    fn child() -> ModelDescriptor {
        let plain = |name: &str, ty, pk| FieldDescriptor {
            name: name.into(),
            kind: FieldKind::Plain(ty),
            nullable: false,
            primary_key: pk,
        };
        ModelDescriptor {
            app_label: "tests".into(),
            name: "ChildModel".into(),
            verbose_name_plural: "childmodels".into(),
            db_schema: "public".into(),
            db_table: "child_model".into(),
            fields: vec![
                plain("id", FieldType::Integer, true),
                plain("count", FieldType::Integer, false),
                plain("name", FieldType::Text, false),
            ],
        }
    }

    #[test]
    fn select_statements() {
        assert_eq!(
            select_by_id(&child()),
            "SELECT \"id\", \"count\", \"name\" FROM \"public\".\"child_model\" WHERE \"id\" = $1"
        );
        assert!(select_all(&child()).ends_with("ORDER BY \"id\""));
    }

    #[test]
    fn insert_binds_only_supplied_columns() {
        let mut values = Record::new();
        values.insert("name".into(), json!("a"));
        let q = insert(&child(), &values).unwrap();
        assert_eq!(
            q.sql,
            "INSERT INTO \"public\".\"child_model\" (\"name\") VALUES ($1) RETURNING \"id\", \"count\", \"name\""
        );
        assert_eq!(q.params, vec![PgBindValue::String(Some("a".into()))]);
    }

    #[test]
    fn update_places_id_last_and_never_sets_pk() {
        let mut values = Record::new();
        values.insert("count".into(), json!(3));
        values.insert("id".into(), json!(99));
        let q = update(&child(), 7, &values).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"public\".\"child_model\" SET \"count\" = $1 WHERE \"id\" = $2 RETURNING \"id\""
        );
        assert_eq!(q.params, vec![PgBindValue::I64(Some(3)), PgBindValue::I64(Some(7))]);

        let empty = update(&child(), 7, &Record::new()).unwrap();
        assert!(empty.sql.contains("SET \"id\" = \"id\""));
    }
}
