//! One generated route: verb, shapes, response table and the bound handler.

use crate::config::SchemaConfig;
use crate::error::ConfigError;
use crate::generator::{Direction, ResponseConfig, ResponseShape, ViewGenerator};
use crate::handlers;
use crate::introspect::ModelIntrospection;
use crate::schema::Schema;
use crate::state::AppState;
use crate::verb::{UrlFragment, Verb};
use axum::http::Method;
use axum::routing::MethodRouter;
use std::collections::HashMap;
use std::sync::Arc;

/// What a handler needs at request time. Shared by every request to the view.
#[derive(Debug)]
pub struct ViewContext {
    pub verb: Verb,
    pub introspection: ModelIntrospection,
    pub request_schema: Option<Arc<Schema>>,
    pub response_schema: Option<Arc<Schema>>,
}

#[derive(Debug)]
pub struct View {
    pub verb: Verb,
    pub url_fragment: UrlFragment,
    pub method: Method,
    pub handler_name: String,
    pub description: Option<String>,
    pub tag: String,
    pub request_schema: Option<Arc<Schema>>,
    pub response_schema: Option<Arc<Schema>>,
    pub response_config: ResponseConfig,
    context: Arc<ViewContext>,
}

impl View {
    pub fn builder(introspection: ModelIntrospection, verb: Verb) -> ViewBuilder {
        ViewBuilder {
            introspection,
            verb,
            request_schema: None,
            response_schema: None,
            request_schema_config: None,
            response_schema_config: None,
            description: None,
            authorized: false,
        }
    }

    /// Every shape the view refers to: request, response and the response table.
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        let table = self.response_config.iter().filter_map(|(_, shape)| match shape {
            ResponseShape::One(s) | ResponseShape::Many(s) => Some(&**s),
            ResponseShape::Empty => None,
        });
        self.request_schema
            .iter()
            .chain(self.response_schema.iter())
            .map(|s| &**s)
            .chain(table)
    }

    /// Axum method router serving this view.
    pub fn method_router(&self) -> MethodRouter<AppState> {
        handlers::method_router(self.context.clone())
    }
}

/// One name, one shape: fails when two views use a schema name for different fields.
pub(crate) fn check_schema_names<'a>(views: impl IntoIterator<Item = &'a View>) -> Result<(), ConfigError> {
    let mut seen: HashMap<&str, &Schema> = HashMap::new();
    for schema in views.into_iter().flat_map(|v| v.schemas()) {
        match seen.get(schema.name.as_str()) {
            Some(existing) if *existing != schema => {
                return Err(ConfigError::SchemaNameConflict(schema.name.clone()));
            }
            Some(_) => {}
            None => {
                seen.insert(schema.name.as_str(), schema);
            }
        }
    }
    Ok(())
}

pub struct ViewBuilder {
    introspection: ModelIntrospection,
    verb: Verb,
    request_schema: Option<Arc<Schema>>,
    response_schema: Option<Arc<Schema>>,
    request_schema_config: Option<SchemaConfig>,
    response_schema_config: Option<SchemaConfig>,
    description: Option<String>,
    authorized: bool,
}

impl ViewBuilder {
    pub fn request_schema(mut self, schema: Arc<Schema>) -> Self {
        self.request_schema = Some(schema);
        self
    }

    pub fn response_schema(mut self, schema: Arc<Schema>) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn request_schema_config(mut self, config: SchemaConfig) -> Self {
        self.request_schema_config = Some(config);
        self
    }

    pub fn response_schema_config(mut self, config: SchemaConfig) -> Self {
        self.response_schema_config = Some(config);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds the 401 entry to the response table.
    pub fn authorized(mut self, authorized: bool) -> Self {
        self.authorized = authorized;
        self
    }

    pub fn build(mut self) -> Result<View, ConfigError> {
        let verb = self.verb;
        let model = self.introspection.model.clone();
        if self.request_schema.is_some() && self.request_schema_config.is_some() {
            return Err(ConfigError::SchemaAndConfig {
                direction: Direction::Request.as_str(),
            });
        }
        if self.response_schema.is_some() && self.response_schema_config.is_some() {
            return Err(ConfigError::SchemaAndConfig {
                direction: Direction::Response.as_str(),
            });
        }
        if !verb.accepts_payload()
            && (self.request_schema.take().is_some() || self.request_schema_config.take().is_some())
        {
            tracing::warn!(model = %model.name, verb = %verb, "request shape ignored for verb without a body");
        }
        if !verb.has_response_schema()
            && (self.response_schema.take().is_some() || self.response_schema_config.take().is_some())
        {
            tracing::warn!(model = %model.name, verb = %verb, "response shape ignored for verb without a body");
        }
        if let Some(schema) = &self.request_schema {
            for f in &schema.fields {
                model.require_field(&f.name)?;
            }
        }

        let mut generator = ViewGenerator::new(
            model.clone(),
            verb,
            self.request_schema,
            self.response_schema,
            self.request_schema_config,
            self.response_schema_config,
        );
        let request_schema = match (verb.accepts_payload(), generator.request_schema()) {
            (false, _) => None,
            (true, Some(s)) => Some(s.clone()),
            (true, None) => Some(generator.generate_request_schema()?),
        };
        let response_schema = match (verb.has_response_schema(), generator.response_schema()) {
            (false, _) => None,
            (true, Some(s)) => Some(s.clone()),
            (true, None) => Some(generator.generate_response_schema()?),
        };

        let error = Arc::new(Schema::api_error());
        let mut response_config = generator.response_config(&error)?;
        if self.authorized {
            response_config.insert(401, ResponseShape::One(error));
        }

        let context = Arc::new(ViewContext {
            verb,
            introspection: self.introspection,
            request_schema: request_schema.clone(),
            response_schema: response_schema.clone(),
        });
        Ok(View {
            verb,
            url_fragment: generator.url_fragment(),
            method: verb.wire_method(),
            handler_name: generator.handler_name(),
            description: self.description,
            tag: model.name.clone(),
            request_schema,
            response_schema,
            response_config,
            context,
        })
    }
}
