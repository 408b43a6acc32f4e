//! crudgen: CRUD route generation for declared models on axum.
//!
//! Models are declared in JSON (or built in code), resolved into a registry and turned into
//! one route group per model: list, create, read, full update, partial update and delete,
//! with request/response shapes derived from the model and documented as OpenAPI.

pub mod auth;
pub mod case;
pub mod config;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod introspect;
pub mod migration;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod verb;
pub mod view;

pub use auth::{Authorizer, HeaderTokenAuth};
pub use config::{
    load_from_path, load_from_str, resolve, FullConfig, ModelDescriptor, ModelRegistry, OptionalFields,
    RouterConfig, SchemaConfig,
};
pub use error::{AppError, ConfigError, StoreError};
pub use generator::{ResponseConfig, ResponseShape, ViewGenerator};
pub use introspect::ModelIntrospection;
pub use migration::apply_migrations;
pub use openapi::openapi_document;
pub use routes::{common_routes, crud_routes, openapi_routes, routers_from_config, CrudRouter};
pub use schema::{Schema, SchemaField, SchemaFieldType};
pub use service::CrudService;
pub use state::AppState;
pub use store::{MemoryStore, ModelStore, PgStore, Record};
pub use telemetry::init_tracing;
pub use verb::{UrlFragment, Verb};
pub use view::{View, ViewBuilder};
