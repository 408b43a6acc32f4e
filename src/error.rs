//! Typed errors and HTTP mapping.

use crate::response::{ApiErrorBody, UNAUTHORIZED_MESSAGE};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Usage errors raised while resolving models or generating routes. Fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("supplied {direction}_schema_config will be ignored because {direction}_schema was supplied")]
    SchemaAndConfig { direction: &'static str },
    #[error("refusing to generate {direction} schema when existing schema was supplied")]
    SchemaAlreadySupplied { direction: &'static str },
    #[error("unsupported HTTP method: {0}")]
    UnsupportedVerb(String),
    #[error("'{0}' cannot be None")]
    MissingArgument(&'static str),
    #[error("model not found: {app_label}.{model}")]
    ModelNotFound { app_label: String, model: String },
    #[error("duplicate model: {0}")]
    DuplicateModel(String),
    #[error("unknown field '{field}' on model {model}")]
    UnknownField { model: String, field: String },
    #[error("only one of 'fields' or 'exclude' should be set")]
    FieldsAndExclude,
    #[error("invalid schema name template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
    #[error("invalid primary key on model {model}: {reason}")]
    InvalidPrimaryKey { model: String, reason: String },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("schema name '{0}' is used for two different shapes")]
    SchemaNameConflict(String),
    #[error("duplicate handler name: {0}")]
    DuplicateHandler(String),
    #[error("config load: {0}")]
    Load(String),
}

/// Persistence faults. Anything here is unexpected from the handlers' point of view.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("unsupported value for {field}: {reason}")]
    Value { field: String, reason: String },
    #[error("store returned no row for {0}")]
    MissingRow(String),
    #[error("{model} with id {id} already exists")]
    DuplicateId { model: String, id: i64 },
}

/// Request-time errors. Expected ones become `{"api_error": ...}` bodies.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Store(StoreError::DuplicateId { .. }) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let api_error = match &self {
            AppError::Store(StoreError::DuplicateId { .. }) => self.to_string(),
            AppError::Config(_) | AppError::Store(_) => {
                tracing::error!(error = %self, "unhandled fault");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(ApiErrorBody { api_error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Store(StoreError::Poisoned).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let duplicate = AppError::Store(StoreError::DuplicateId { model: "ChildModel".into(), id: 1 });
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.to_string(), "ChildModel with id 1 already exists");
    }

    #[test]
    fn usage_error_messages() {
        let e = ConfigError::SchemaAndConfig { direction: "request" };
        assert_eq!(
            e.to_string(),
            "supplied request_schema_config will be ignored because request_schema was supplied"
        );
        assert_eq!(ConfigError::MissingArgument("model").to_string(), "'model' cannot be None");
    }
}
