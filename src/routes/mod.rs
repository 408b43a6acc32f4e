//! Router assembly.

pub mod common;
pub mod crud;

pub use common::{common_routes, openapi_routes};
pub use crud::{crud_routes, routers_from_config, CrudRouter, CrudRouterBuilder, DEFAULT_BODY_LIMIT};
