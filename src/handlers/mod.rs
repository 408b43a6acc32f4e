//! HTTP adapters binding a view context to axum method routers.

pub mod record;

use crate::state::AppState;
use crate::verb::Verb;
use crate::view::ViewContext;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, patch, post, put, MethodRouter},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

pub fn method_router(ctx: Arc<ViewContext>) -> MethodRouter<AppState> {
    let verb = ctx.verb;
    match verb {
        Verb::Get => get(move |State(state): State<AppState>, Path(id): Path<String>| {
            record::read(state, ctx.clone(), id)
        }),
        Verb::GetList => get(move |State(state): State<AppState>| record::list(state, ctx.clone())),
        Verb::Post => post(
            move |State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>| {
                record::create(state, ctx.clone(), body)
            },
        ),
        Verb::Put => put(
            move |State(state): State<AppState>,
                  Path(id): Path<String>,
                  body: Result<Json<Value>, JsonRejection>| {
                record::update(state, ctx.clone(), id, body)
            },
        ),
        Verb::Patch => patch(
            move |State(state): State<AppState>,
                  Path(id): Path<String>,
                  body: Result<Json<Value>, JsonRejection>| {
                record::update(state, ctx.clone(), id, body)
            },
        ),
        Verb::Delete => delete(move |State(state): State<AppState>, Path(id): Path<String>| {
            record::delete(state, ctx.clone(), id)
        }),
    }
}
