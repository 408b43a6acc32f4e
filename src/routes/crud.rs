//! CRUD route groups: one model, a chosen set of verbs, mounted under `/<plural>/`.

use crate::auth::{self, Authorizer, HeaderTokenAuth};
use crate::config::{ModelDescriptor, ModelRegistry, RouterConfig, SchemaConfig};
use crate::error::ConfigError;
use crate::introspect::ModelIntrospection;
use crate::schema::Schema;
use crate::state::AppState;
use crate::verb::Verb;
use crate::view::{check_schema_names, View};
use axum::Router;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Default cap on request bodies for generated routes.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

enum ModelRef {
    Descriptor(Arc<ModelDescriptor>),
    Named(String),
}

/// The generated views for one model.
pub struct CrudRouter {
    model: Arc<ModelDescriptor>,
    base_url_path: String,
    views: Vec<View>,
    authorizer: Option<Arc<dyn Authorizer>>,
}

impl std::fmt::Debug for CrudRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudRouter")
            .field("model", &self.model.name)
            .field("base_url_path", &self.base_url_path)
            .field("views", &self.views.len())
            .field("authorized", &self.authorizer.is_some())
            .finish()
    }
}

impl CrudRouter {
    pub fn builder() -> CrudRouterBuilder {
        CrudRouterBuilder::default()
    }

    /// Build from a router entry of the JSON config.
    pub fn from_config(config: &RouterConfig, registry: &ModelRegistry) -> Result<Self, ConfigError> {
        let mut builder = CrudRouter::builder()
            .app_label(&config.app_label)
            .model(&config.model)
            .methods(config.methods.iter().copied());
        if let Some(auth) = &config.auth {
            builder = builder.auth(HeaderTokenAuth::from_config(auth)?);
        }
        for (verb, c) in &config.request_schema_configs {
            builder = builder.request_schema_config(*verb, c.clone());
        }
        for (verb, c) in &config.response_schema_configs {
            builder = builder.response_schema_config(*verb, c.clone());
        }
        for (verb, d) in &config.descriptions {
            builder = builder.description(*verb, d.clone());
        }
        builder.build(registry)
    }

    pub fn model(&self) -> &Arc<ModelDescriptor> {
        &self.model
    }

    /// `/<verbose_name_plural>/`
    pub fn base_url_path(&self) -> &str {
        &self.base_url_path
    }

    /// Documentation grouping label.
    pub fn tag(&self) -> &str {
        &self.model.name
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn view(&self, verb: Verb) -> Option<&View> {
        self.views.iter().find(|v| v.verb == verb)
    }

    /// Routes relative to the base path, for `Router::nest`.
    pub fn router(&self) -> Router<AppState> {
        self.routes("")
    }

    /// Prefix and relative router, as passed to `Router::nest`. The prefix has no
    /// trailing slash, so a nested collection answers at `/<plural>` rather than the
    /// `/<plural>/` that [`CrudRouter::mounted`] serves.
    pub fn add_router_args(&self) -> (String, Router<AppState>) {
        (self.base_url_path.trim_end_matches('/').to_string(), self.router())
    }

    /// Routes at their absolute paths, for `Router::merge`. Keeps the trailing slash
    /// on the collection route.
    pub fn mounted(&self) -> Router<AppState> {
        self.routes(&self.base_url_path)
    }

    fn routes(&self, prefix: &str) -> Router<AppState> {
        let prefix = prefix.trim_end_matches('/');
        let mut router = Router::new();
        for view in &self.views {
            let path = format!("{}{}", prefix, view.url_fragment.route_path());
            router = router.route(&path, view.method_router());
        }
        match &self.authorizer {
            Some(a) => auth::require(router, a.clone()),
            None => router,
        }
    }
}

#[derive(Default)]
pub struct CrudRouterBuilder {
    app_label: Option<String>,
    model: Option<ModelRef>,
    methods: Option<Vec<Verb>>,
    method_names: Vec<String>,
    authorizer: Option<Arc<dyn Authorizer>>,
    request_schemas: HashMap<Verb, Arc<Schema>>,
    response_schemas: HashMap<Verb, Arc<Schema>>,
    request_schema_configs: HashMap<Verb, SchemaConfig>,
    response_schema_configs: HashMap<Verb, SchemaConfig>,
    descriptions: HashMap<Verb, String>,
}

impl CrudRouterBuilder {
    pub fn app_label(mut self, app_label: impl Into<String>) -> Self {
        self.app_label = Some(app_label.into());
        self
    }

    /// Model by name, looked up under the app label at build time.
    pub fn model(mut self, name: impl Into<String>) -> Self {
        self.model = Some(ModelRef::Named(name.into()));
        self
    }

    pub fn model_descriptor(mut self, model: Arc<ModelDescriptor>) -> Self {
        self.model = Some(ModelRef::Descriptor(model));
        self
    }

    /// Defaults to every verb.
    pub fn methods(mut self, methods: impl IntoIterator<Item = Verb>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Verbs by name (`"GETLIST"`, `"patch"`...); unknown names fail at build time.
    pub fn method_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.get_or_insert_with(Vec::new);
        self.method_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn auth(mut self, authorizer: impl Authorizer) -> Self {
        self.authorizer = Some(Arc::new(authorizer));
        self
    }

    pub fn request_schema(mut self, verb: Verb, schema: Arc<Schema>) -> Self {
        self.request_schemas.insert(verb, schema);
        self
    }

    pub fn response_schema(mut self, verb: Verb, schema: Arc<Schema>) -> Self {
        self.response_schemas.insert(verb, schema);
        self
    }

    pub fn request_schema_config(mut self, verb: Verb, config: SchemaConfig) -> Self {
        self.request_schema_configs.insert(verb, config);
        self
    }

    pub fn response_schema_config(mut self, verb: Verb, config: SchemaConfig) -> Self {
        self.response_schema_configs.insert(verb, config);
        self
    }

    pub fn description(mut self, verb: Verb, description: impl Into<String>) -> Self {
        self.descriptions.insert(verb, description.into());
        self
    }

    pub fn build(mut self, registry: &ModelRegistry) -> Result<CrudRouter, ConfigError> {
        let model = match self.model.take() {
            None => return Err(ConfigError::MissingArgument("model")),
            Some(ModelRef::Descriptor(m)) => m,
            Some(ModelRef::Named(name)) => {
                let app_label = self
                    .app_label
                    .as_deref()
                    .ok_or(ConfigError::MissingArgument("app_label"))?;
                registry.get(app_label, &name)?
            }
        };

        let mut verbs = self.methods.take().unwrap_or_else(|| Verb::ALL.to_vec());
        for name in &self.method_names {
            verbs.push(name.parse()?);
        }
        let mut seen = HashSet::new();
        verbs.retain(|v| seen.insert(*v));
        if verbs.is_empty() {
            return Err(ConfigError::MissingArgument("http_methods"));
        }

        let introspection = ModelIntrospection::new(model.clone(), registry)?;
        let authorized = self.authorizer.is_some();
        let mut views = Vec::with_capacity(verbs.len());
        for verb in verbs {
            let mut view = View::builder(introspection.clone(), verb).authorized(authorized);
            if let Some(s) = self.request_schemas.remove(&verb) {
                view = view.request_schema(s);
            }
            if let Some(s) = self.response_schemas.remove(&verb) {
                view = view.response_schema(s);
            }
            if let Some(c) = self.request_schema_configs.remove(&verb) {
                view = view.request_schema_config(c);
            }
            if let Some(c) = self.response_schema_configs.remove(&verb) {
                view = view.response_schema_config(c);
            }
            if let Some(d) = self.descriptions.remove(&verb) {
                view = view.description(d);
            }
            views.push(view.build()?);
        }
        check_schema_names(&views)?;

        let base_url_path = format!("/{}/", model.verbose_name_plural);
        for view in &views {
            tracing::info!(
                model = %model.name,
                verb = %view.verb,
                path = %format!("{}{}", base_url_path.trim_end_matches('/'), view.url_fragment.as_str()),
                handler = %view.handler_name,
                "route generated"
            );
        }
        Ok(CrudRouter {
            model,
            base_url_path,
            views,
            authorizer: self.authorizer,
        })
    }
}

/// Mount every group at its absolute path, with request tracing and a body limit.
/// Handler names must be unique across groups, and each schema name must denote one shape.
pub fn crud_routes(groups: &[CrudRouter], state: AppState) -> Result<Router, ConfigError> {
    check_schema_names(groups.iter().flat_map(|g| g.views()))?;
    let mut names = HashSet::new();
    let mut router = Router::new();
    for group in groups {
        for view in group.views() {
            if !names.insert(view.handler_name.as_str()) {
                return Err(ConfigError::DuplicateHandler(view.handler_name.clone()));
            }
        }
        router = router.merge(group.mounted());
    }
    Ok(router
        .layer(RequestBodyLimitLayer::new(DEFAULT_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Build a group per router entry in the config.
pub fn routers_from_config(
    configs: &[RouterConfig],
    registry: &ModelRegistry,
) -> Result<Vec<CrudRouter>, ConfigError> {
    configs.iter().map(|c| CrudRouter::from_config(c, registry)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_from_str, resolve};

    fn registry() -> ModelRegistry {
        resolve(
            &load_from_str(
                r#"{"models": [
                    {"app_label": "tests", "name": "ChildModel", "fields": [
                        {"name": "count", "type": "integer"}, {"name": "name", "type": "text"}]},
                    {"app_label": "tests", "name": "OtherModel", "verbose_name_plural": "others", "fields": [
                        {"name": "name", "type": "text"}]}
                ]}"#,
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn base_path_uses_plural_name() {
        let r = CrudRouter::builder()
            .app_label("tests")
            .model("ChildModel")
            .build(&registry())
            .unwrap();
        assert_eq!(r.base_url_path(), "/childmodels/");
        assert_eq!(r.views().len(), 6);
        assert_eq!(r.add_router_args().0, "/childmodels");
        let other = CrudRouter::builder()
            .app_label("tests")
            .model("OtherModel")
            .build(&registry())
            .unwrap();
        assert_eq!(other.base_url_path(), "/others/");
    }

    #[test]
    fn missing_arguments_and_unknown_verbs() {
        let reg = registry();
        assert!(matches!(
            CrudRouter::builder().app_label("tests").build(&reg),
            Err(ConfigError::MissingArgument("model"))
        ));
        assert!(matches!(
            CrudRouter::builder().model("ChildModel").build(&reg),
            Err(ConfigError::MissingArgument("app_label"))
        ));
        assert!(matches!(
            CrudRouter::builder()
                .app_label("tests")
                .model("ChildModel")
                .method_names(["FETCH"])
                .build(&reg),
            Err(ConfigError::UnsupportedVerb(_))
        ));
        assert!(matches!(
            CrudRouter::builder()
                .app_label("tests")
                .model("Nope")
                .build(&reg),
            Err(ConfigError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn method_subset_and_dedup() {
        let r = CrudRouter::builder()
            .app_label("tests")
            .model("ChildModel")
            .method_names(["getlist", "POST", "post"])
            .build(&registry())
            .unwrap();
        let verbs: Vec<Verb> = r.views().iter().map(|v| v.verb).collect();
        assert_eq!(verbs, vec![Verb::GetList, Verb::Post]);
        assert!(r.view(Verb::Delete).is_none());
    }

    #[test]
    fn one_schema_name_for_two_shapes_is_rejected() {
        let err = CrudRouter::builder()
            .app_label("tests")
            .model("ChildModel")
            .request_schema_config(
                Verb::Put,
                SchemaConfig {
                    optional_fields: Some(crate::config::OptionalFields::Named(vec!["name".into()])),
                    ..Default::default()
                },
            )
            .build(&registry())
            .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaNameConflict(name) if name == "GeneratedChildModelIn"));

        let renamed = CrudRouter::builder()
            .app_label("tests")
            .model("ChildModel")
            .request_schema_config(
                Verb::Put,
                SchemaConfig {
                    name: Some("{model}PutIn".into()),
                    optional_fields: Some(crate::config::OptionalFields::Named(vec!["name".into()])),
                    ..Default::default()
                },
            )
            .build(&registry())
            .unwrap();
        let put = renamed.view(Verb::Put).unwrap().request_schema.clone().unwrap();
        assert_eq!(put.name, "ChildModelPutIn");
        assert!(put.field("name").unwrap().optional);
    }
}
