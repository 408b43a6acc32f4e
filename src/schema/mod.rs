//! Generated request/response shapes: derivation from a model, payload decoding
//! and record projection.

pub mod template;

pub use template::format_name;

use crate::config::{FieldKind, FieldType, ModelDescriptor, OptionalFields, SchemaConfig};
use crate::error::{AppError, ConfigError};
use crate::store::Record;
use serde_json::{Map, Value};

/// Name of the fixed error shape.
pub const API_ERROR_SCHEMA: &str = "ApiError";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaFieldType {
    Plain(FieldType),
    /// Id of one related record.
    RelationId,
    /// Ids of many related records.
    RelationIds,
}

impl From<&FieldKind> for SchemaFieldType {
    fn from(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Plain(ty) => SchemaFieldType::Plain(*ty),
            FieldKind::Single { .. } => SchemaFieldType::RelationId,
            FieldKind::Multi { .. } => SchemaFieldType::RelationIds,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub ty: SchemaFieldType,
    /// May be absent from a payload.
    pub optional: bool,
    /// May be `null`.
    pub nullable: bool,
}

impl SchemaField {
    pub fn required(name: impl Into<String>, ty: SchemaFieldType) -> Self {
        SchemaField {
            name: name.into(),
            ty,
            optional: false,
            nullable: false,
        }
    }
}

/// A named data shape. Generated from a model or supplied explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Schema {
            name: name.into(),
            fields,
        }
    }

    /// `{api_error: text}`
    pub fn api_error() -> Self {
        Schema::new(
            API_ERROR_SCHEMA,
            vec![SchemaField::required("api_error", SchemaFieldType::Plain(FieldType::Text))],
        )
    }

    /// Derive a shape from the model's fields under a merged config.
    pub fn from_model(
        model: &ModelDescriptor,
        config: &SchemaConfig,
        name: String,
    ) -> Result<Schema, ConfigError> {
        if config.fields.is_some() && config.exclude.is_some() {
            return Err(ConfigError::FieldsAndExclude);
        }
        if let Some(fields) = &config.fields {
            for f in fields {
                model.require_field(f)?;
            }
        }
        if let Some(OptionalFields::Named(names)) = &config.optional_fields {
            for f in names {
                model.require_field(f)?;
            }
        }

        let fields = model
            .fields
            .iter()
            .filter(|f| match (&config.fields, &config.exclude) {
                (Some(include), _) => include.iter().any(|n| n == &f.name),
                (None, Some(exclude)) => !exclude.iter().any(|n| n == &f.name),
                (None, None) => true,
            })
            .map(|f| {
                // Nullable and primary-key fields default to null or the store's id.
                let optional = f.nullable
                    || f.primary_key
                    || match &config.optional_fields {
                        Some(OptionalFields::All) => true,
                        Some(OptionalFields::Named(names)) => names.iter().any(|n| n == &f.name),
                        None => false,
                    };
                SchemaField {
                    name: f.name.clone(),
                    ty: SchemaFieldType::from(&f.kind),
                    optional,
                    nullable: f.nullable,
                }
            })
            .collect();
        Ok(Schema { name, fields })
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Decode a request body, keeping only the fields that were explicitly set.
    /// Unknown keys are ignored; type mismatches and missing required fields fail.
    pub fn decode(&self, body: Value) -> Result<Record, AppError> {
        let mut body = match body {
            Value::Object(map) => map,
            _ => return Err(AppError::Validation("request body must be a JSON object".into())),
        };
        let mut out = Map::new();
        let mut problems = Vec::new();
        for field in &self.fields {
            match body.remove(&field.name) {
                None if field.optional => {}
                None => problems.push(format!("{}: field required", field.name)),
                Some(Value::Null) if field.nullable => {
                    out.insert(field.name.clone(), Value::Null);
                }
                Some(Value::Null) => problems.push(format!("{}: may not be null", field.name)),
                Some(v) => match check_type(&field.ty, &v) {
                    Ok(()) => {
                        out.insert(field.name.clone(), v);
                    }
                    Err(expected) => {
                        problems.push(format!("{}: expected {}", field.name, expected))
                    }
                },
            }
        }
        if !problems.is_empty() {
            return Err(AppError::Validation(problems.join("; ")));
        }
        Ok(out)
    }

    /// Shape a stored record for a response: schema fields only, missing as null.
    pub fn project(&self, record: &Record) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), record.get(&f.name).cloned().unwrap_or(Value::Null)))
            .collect();
        Value::Object(map)
    }
}

fn check_type(ty: &SchemaFieldType, v: &Value) -> Result<(), &'static str> {
    let ok = match ty {
        SchemaFieldType::Plain(FieldType::Integer) | SchemaFieldType::RelationId => v.is_i64(),
        SchemaFieldType::Plain(FieldType::Float) => v.is_number(),
        SchemaFieldType::Plain(FieldType::Text) => v.is_string(),
        SchemaFieldType::Plain(FieldType::Boolean) => v.is_boolean(),
        SchemaFieldType::Plain(FieldType::Date) => v
            .as_str()
            .map(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
            .unwrap_or(false),
        SchemaFieldType::Plain(FieldType::Datetime) => v
            .as_str()
            .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
            .unwrap_or(false),
        SchemaFieldType::Plain(FieldType::Uuid) => v
            .as_str()
            .map(|s| uuid::Uuid::parse_str(s).is_ok())
            .unwrap_or(false),
        SchemaFieldType::Plain(FieldType::Json) => true,
        SchemaFieldType::RelationIds => v
            .as_array()
            .map(|items| items.iter().all(Value::is_i64))
            .unwrap_or(false),
    };
    if ok {
        Ok(())
    } else {
        Err(expected_name(ty))
    }
}

fn expected_name(ty: &SchemaFieldType) -> &'static str {
    match ty {
        SchemaFieldType::Plain(FieldType::Integer) => "an integer",
        SchemaFieldType::Plain(FieldType::Float) => "a number",
        SchemaFieldType::Plain(FieldType::Text) => "a string",
        SchemaFieldType::Plain(FieldType::Boolean) => "a boolean",
        SchemaFieldType::Plain(FieldType::Date) => "a date (YYYY-MM-DD)",
        SchemaFieldType::Plain(FieldType::Datetime) => "an RFC 3339 datetime",
        SchemaFieldType::Plain(FieldType::Uuid) => "a UUID",
        SchemaFieldType::Plain(FieldType::Json) => "JSON",
        SchemaFieldType::RelationId => "an integer id",
        SchemaFieldType::RelationIds => "a list of integer ids",
    }
}
