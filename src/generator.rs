//! Per-verb generation of schemas and response tables for one model.

use crate::config::{ModelDescriptor, SchemaConfig};
use crate::error::ConfigError;
use crate::schema::{format_name, Schema};
use crate::verb::{UrlFragment, Verb};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Direction of a generated shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Direction::Request => "In",
            Direction::Response => "Out",
        }
    }
}

/// What a status code answers with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseShape {
    One(Arc<Schema>),
    Many(Arc<Schema>),
    Empty,
}

/// Status code to response shape, fixed per verb.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseConfig(BTreeMap<u16, ResponseShape>);

impl ResponseConfig {
    pub fn insert(&mut self, status: u16, shape: ResponseShape) {
        self.0.insert(status, shape);
    }

    pub fn get(&self, status: u16) -> Option<&ResponseShape> {
        self.0.get(&status)
    }

    pub fn status_codes(&self) -> Vec<u16> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &ResponseShape)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

/// Holds the inputs for one verb of one model and generates the missing schemas.
#[derive(Debug)]
pub struct ViewGenerator {
    model: Arc<ModelDescriptor>,
    verb: Verb,
    request_schema: Option<Arc<Schema>>,
    response_schema: Option<Arc<Schema>>,
    request_schema_config: SchemaConfig,
    response_schema_config: SchemaConfig,
}

impl ViewGenerator {
    pub fn new(
        model: Arc<ModelDescriptor>,
        verb: Verb,
        request_schema: Option<Arc<Schema>>,
        response_schema: Option<Arc<Schema>>,
        request_schema_config: Option<SchemaConfig>,
        response_schema_config: Option<SchemaConfig>,
    ) -> Self {
        ViewGenerator {
            model,
            verb,
            request_schema,
            response_schema,
            request_schema_config: request_schema_config.unwrap_or_default(),
            response_schema_config: response_schema_config.unwrap_or_default(),
        }
    }

    pub fn model(&self) -> &Arc<ModelDescriptor> {
        &self.model
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn request_schema(&self) -> Option<&Arc<Schema>> {
        self.request_schema.as_ref()
    }

    pub fn response_schema(&self) -> Option<&Arc<Schema>> {
        self.response_schema.as_ref()
    }

    /// Generate the request shape. Refuses when one was supplied.
    pub fn generate_request_schema(&mut self) -> Result<Arc<Schema>, ConfigError> {
        if self.request_schema.is_some() {
            return Err(ConfigError::SchemaAlreadySupplied {
                direction: Direction::Request.as_str(),
            });
        }
        let config = self.determine_schema_config(Direction::Request)?;
        let schema = self.build_schema(config)?;
        self.request_schema = Some(schema.clone());
        Ok(schema)
    }

    /// Generate the response shape. Refuses when one was supplied.
    pub fn generate_response_schema(&mut self) -> Result<Arc<Schema>, ConfigError> {
        if self.response_schema.is_some() {
            return Err(ConfigError::SchemaAlreadySupplied {
                direction: Direction::Response.as_str(),
            });
        }
        let config = self.determine_schema_config(Direction::Response)?;
        let schema = self.build_schema(config)?;
        self.response_schema = Some(schema.clone());
        Ok(schema)
    }

    fn build_schema(&self, config: SchemaConfig) -> Result<Arc<Schema>, ConfigError> {
        let name = config.name.clone().unwrap_or_default();
        Ok(Arc::new(Schema::from_model(&self.model, &config, name)?))
    }

    /// Verb defaults overlaid with user overrides, with the final name resolved.
    pub fn determine_schema_config(&self, direction: Direction) -> Result<SchemaConfig, ConfigError> {
        let (defaults, overrides) = match direction {
            Direction::Request => (
                self.verb.default_request_schema_config(),
                &self.request_schema_config,
            ),
            Direction::Response => (
                self.verb.default_response_schema_config(),
                &self.response_schema_config,
            ),
        };
        let mut config = SchemaConfig::merged(&defaults, overrides);
        let http_verb = self.verb.title();
        config.name = Some(match config.name.take() {
            Some(template) => format_name(&template, &self.model.name, http_verb)?,
            None => format!("Generated{}{}{}", self.model.name, http_verb, direction.suffix()),
        });
        Ok(config)
    }

    pub fn url_fragment(&self) -> UrlFragment {
        self.verb.url_fragment()
    }

    /// `<model>_<verb>`; unique across models sharing a namespace.
    pub fn handler_name(&self) -> String {
        format!("{}_{}", self.model.name.to_lowercase(), self.verb.handler_suffix())
    }

    /// Status table for the verb. Needs the response schema for verbs that return records.
    pub fn response_config(&self, error_schema: &Arc<Schema>) -> Result<ResponseConfig, ConfigError> {
        let out = || {
            self.response_schema
                .clone()
                .ok_or(ConfigError::MissingArgument("response_schema"))
        };
        let error = ResponseShape::One(error_schema.clone());
        let mut config = ResponseConfig::default();
        match self.verb {
            Verb::Get => {
                config.insert(200, ResponseShape::One(out()?));
                config.insert(404, error);
            }
            Verb::GetList => {
                config.insert(200, ResponseShape::Many(out()?));
            }
            Verb::Post => {
                config.insert(200, ResponseShape::One(out()?));
                config.insert(400, error);
            }
            Verb::Put | Verb::Patch => {
                config.insert(200, ResponseShape::One(out()?));
                config.insert(404, error);
            }
            Verb::Delete => {
                config.insert(200, ResponseShape::Empty);
                config.insert(404, error);
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve, OptionalFields};

    fn child() -> Arc<ModelDescriptor> {
        let registry = resolve(
            &load_from_str(
                r#"{"models": [{"app_label": "tests", "name": "ChildModel", "fields": [
                    {"name": "count", "type": "integer"}, {"name": "name", "type": "text"}]}]}"#,
            )
            .unwrap(),
        )
        .unwrap();
        registry.get("tests", "ChildModel").unwrap()
    }

    fn generator(verb: Verb) -> ViewGenerator {
        ViewGenerator::new(child(), verb, None, None, None, None)
    }

    #[test]
    fn default_names_per_verb() {
        let name = |verb, dir| {
            generator(verb)
                .determine_schema_config(dir)
                .unwrap()
                .name
                .unwrap()
        };
        assert_eq!(name(Verb::Post, Direction::Request), "GeneratedChildModelIn");
        assert_eq!(name(Verb::Put, Direction::Request), "GeneratedChildModelIn");
        assert_eq!(name(Verb::Patch, Direction::Request), "GeneratedChildModelPatchIn");
        assert_eq!(name(Verb::Get, Direction::Response), "GeneratedChildModelOut");
        assert_eq!(name(Verb::GetList, Direction::Response), "GeneratedChildModelOut");
        assert_eq!(name(Verb::Delete, Direction::Response), "GeneratedChildModelDeleteOut");
    }

    #[test]
    fn override_name_is_a_template() {
        let mut g = ViewGenerator::new(
            child(),
            Verb::GetList,
            None,
            None,
            None,
            Some(SchemaConfig {
                name: Some("{model}{http_verb}Row".into()),
                ..Default::default()
            }),
        );
        assert_eq!(g.generate_response_schema().unwrap().name, "ChildModelGetRow");
    }

    #[test]
    fn patch_request_is_all_optional_without_id() {
        let mut g = generator(Verb::Patch);
        let schema = g.generate_request_schema().unwrap();
        assert!(schema.field("id").is_none());
        assert!(schema.fields.iter().all(|f| f.optional));
        let config = g.determine_schema_config(Direction::Request).unwrap();
        assert_eq!(config.optional_fields, Some(OptionalFields::All));
    }

    #[test]
    fn refuses_to_regenerate_supplied_schema() {
        let supplied = Arc::new(Schema::new("DummySchema", vec![]));
        let mut g = ViewGenerator::new(child(), Verb::Post, Some(supplied.clone()), Some(supplied), None, None);
        assert!(matches!(
            g.generate_request_schema(),
            Err(ConfigError::SchemaAlreadySupplied { direction: "request" })
        ));
        assert!(matches!(
            g.generate_response_schema(),
            Err(ConfigError::SchemaAlreadySupplied { direction: "response" })
        ));
    }

    #[test]
    fn response_tables_per_verb() {
        let error = Arc::new(Schema::api_error());
        let expected: [(Verb, &[u16]); 6] = [
            (Verb::Get, &[200, 404]),
            (Verb::GetList, &[200]),
            (Verb::Post, &[200, 400]),
            (Verb::Put, &[200, 404]),
            (Verb::Patch, &[200, 404]),
            (Verb::Delete, &[200, 404]),
        ];
        for (verb, codes) in expected {
            let mut g = generator(verb);
            if verb.has_response_schema() {
                g.generate_response_schema().unwrap();
            }
            let table = g.response_config(&error).unwrap();
            assert_eq!(table.status_codes(), codes, "{}", verb);
        }
        let mut list = generator(Verb::GetList);
        list.generate_response_schema().unwrap();
        assert!(matches!(
            list.response_config(&error).unwrap().get(200),
            Some(ResponseShape::Many(s)) if s.name == "GeneratedChildModelOut"
        ));
        let delete = generator(Verb::Delete);
        assert_eq!(delete.response_config(&error).unwrap().get(200), Some(&ResponseShape::Empty));
    }

    #[test]
    fn handler_names_carry_model_prefix() {
        assert_eq!(generator(Verb::GetList).handler_name(), "childmodel_get_list");
        assert_eq!(generator(Verb::Delete).handler_name(), "childmodel_delete");
    }
}
