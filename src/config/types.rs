//! Raw config types as read from JSON (models + routers).

use crate::verb::Verb;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    Datetime,
    Uuid,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    ForeignKey,
    OneToOne,
    ManyToMany,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationConfig {
    pub kind: RelationKind,
    /// Related model's object name, looked up in the same app label.
    pub to: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Required for plain fields; ignored when `relation` is set.
    #[serde(default, rename = "type")]
    pub type_: Option<FieldType>,
    #[serde(default)]
    pub relation: Option<RelationConfig>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub app_label: String,
    pub name: String,
    #[serde(default)]
    pub verbose_name_plural: Option<String>,
    #[serde(default)]
    pub db_schema: Option<String>,
    #[serde(default)]
    pub db_table: Option<String>,
    pub fields: Vec<FieldConfig>,
}

/// Which fields of a generated schema are optional. `"__all__"` or a list of names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionalFields {
    All,
    Named(Vec<String>),
}

const ALL_FIELDS: &str = "__all__";

impl Serialize for OptionalFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionalFields::All => serializer.serialize_str(ALL_FIELDS),
            OptionalFields::Named(names) => names.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for OptionalFields {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        match v {
            serde_json::Value::String(s) if s == ALL_FIELDS => Ok(OptionalFields::All),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s),
                    other => Err(serde::de::Error::custom(format!(
                        "optional_fields entries must be strings; got {}",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(OptionalFields::Named),
            other => Err(serde::de::Error::custom(format!(
                "optional_fields must be \"{}\" or a list of field names; got {}",
                ALL_FIELDS, other
            ))),
        }
    }
}

/// Options for one generated schema. Every entry is an override: unset entries
/// fall back to the verb's defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Name template; `{model}` and `{http_verb}` are substituted.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub optional_fields: Option<OptionalFields>,
}

impl SchemaConfig {
    /// Field-by-field merge; entries set on `overrides` win. `fields` and `exclude`
    /// are one selection: overriding either drops the default of the other.
    pub fn merged(defaults: &SchemaConfig, overrides: &SchemaConfig) -> SchemaConfig {
        let (fields, exclude) = if overrides.fields.is_some() || overrides.exclude.is_some() {
            (overrides.fields.clone(), overrides.exclude.clone())
        } else {
            (defaults.fields.clone(), defaults.exclude.clone())
        };
        SchemaConfig {
            name: overrides.name.clone().or_else(|| defaults.name.clone()),
            fields,
            exclude,
            optional_fields: overrides
                .optional_fields
                .clone()
                .or_else(|| defaults.optional_fields.clone()),
        }
    }
}

/// Auth requirement for a router from config: a static bearer token list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_auth_header")]
    pub header: String,
    pub tokens: Vec<String>,
}

fn default_auth_header() -> String {
    "authorization".into()
}

fn default_methods() -> Vec<Verb> {
    Verb::ALL.to_vec()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouterConfig {
    pub app_label: String,
    pub model: String,
    #[serde(default = "default_methods")]
    pub methods: Vec<Verb>,
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    #[serde(default)]
    pub request_schema_configs: HashMap<Verb, SchemaConfig>,
    #[serde(default)]
    pub response_schema_configs: HashMap<Verb, SchemaConfig>,
    #[serde(default)]
    pub descriptions: HashMap<Verb, String>,
}

/// All config in one struct for in-memory or file loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FullConfig {
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub routers: Vec<RouterConfig>,
}
