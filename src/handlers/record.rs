//! Record handlers: read, list, create, update, delete.
//! Each takes the view's context; bodies are shaped by its schemas.

use crate::error::{AppError, ConfigError};
use crate::response::object_missing;
use crate::schema::Schema;
use crate::service::CrudService;
use crate::state::AppState;
use crate::view::ViewContext;
use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use serde_json::Value;
use std::sync::Arc;

/// Non-integer ids address nothing.
fn parse_id(ctx: &ViewContext, raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(object_missing(&ctx.introspection.model.name)))
}

fn response_schema(ctx: &ViewContext) -> Result<&Arc<Schema>, AppError> {
    ctx.response_schema
        .as_ref()
        .ok_or(AppError::Config(ConfigError::MissingArgument("response_schema")))
}

fn decode_body(ctx: &ViewContext, body: Result<Json<Value>, JsonRejection>) -> Result<crate::store::Record, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let schema = ctx
        .request_schema
        .as_ref()
        .ok_or(AppError::Config(ConfigError::MissingArgument("request_schema")))?;
    schema.decode(body)
}

pub async fn read(state: AppState, ctx: Arc<ViewContext>, id: String) -> Result<Json<Value>, AppError> {
    let id = parse_id(&ctx, &id)?;
    let record = CrudService::read(state.store.as_ref(), &ctx.introspection.model, id).await?;
    Ok(Json(response_schema(&ctx)?.project(&record)))
}

pub async fn list(state: AppState, ctx: Arc<ViewContext>) -> Result<Json<Value>, AppError> {
    let rows = CrudService::list(state.store.as_ref(), &ctx.introspection.model).await?;
    let schema = response_schema(&ctx)?;
    Ok(Json(Value::Array(rows.iter().map(|r| schema.project(r)).collect())))
}

pub async fn create(
    state: AppState,
    ctx: Arc<ViewContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let payload = decode_body(&ctx, body)?;
    let record = CrudService::create(state.store.as_ref(), &ctx.introspection, payload).await?;
    Ok(Json(response_schema(&ctx)?.project(&record)))
}

/// Full and partial updates differ only in the request schema.
pub async fn update(
    state: AppState,
    ctx: Arc<ViewContext>,
    id: String,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&ctx, &id)?;
    let payload = decode_body(&ctx, body)?;
    let record = CrudService::update(state.store.as_ref(), &ctx.introspection, id, payload).await?;
    Ok(Json(response_schema(&ctx)?.project(&record)))
}

/// 200 with an empty body.
pub async fn delete(state: AppState, ctx: Arc<ViewContext>, id: String) -> Result<StatusCode, AppError> {
    let id = parse_id(&ctx, &id)?;
    CrudService::delete(state.store.as_ref(), &ctx.introspection.model, id).await?;
    Ok(StatusCode::OK)
}
