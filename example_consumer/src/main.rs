//! Demo server: serves generated CRUD routes for the models in `MODELS_PATH`.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! With `DATABASE_URL` set, records live in PostgreSQL (tables are created on start);
//! otherwise they are kept in memory. `API_TOKEN` guards every generated route.

use crudgen::{
    apply_migrations, common_routes, crud_routes, init_tracing, load_from_path, openapi_document,
    openapi_routes, resolve, AppState, CrudRouter, MemoryStore, PgStore,
};
use crudgen::config::AuthConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("crudgen=info,example_consumer=info");

    let models_path =
        std::env::var("MODELS_PATH").unwrap_or_else(|_| "example_consumer/models.json".into());
    let config = load_from_path(&models_path).await?;
    let registry = resolve(&config)?;
    tracing::info!(path = %models_path, models = registry.models().len(), "models loaded");

    let token = std::env::var("API_TOKEN").ok().filter(|t| !t.is_empty());
    let mut groups = Vec::with_capacity(config.routers.len());
    for router in &config.routers {
        let group = match (&token, &router.auth) {
            (Some(token), None) => {
                let mut with_auth = router.clone();
                with_auth.auth = Some(AuthConfig {
                    header: "authorization".into(),
                    tokens: vec![token.clone()],
                });
                CrudRouter::from_config(&with_auth, &registry)?
            }
            _ => CrudRouter::from_config(router, &registry)?,
        };
        groups.push(group);
    }
    if token.is_some() {
        tracing::info!("generated routes require a bearer token");
    }

    let state = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await?;
            apply_migrations(&pool, &registry).await?;
            tracing::info!("using PostgreSQL store");
            AppState::new(PgStore::new(pool))
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            AppState::new(MemoryStore::new())
        }
    };

    let doc = openapi_document(&groups, env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    let app = crud_routes(&groups, state.clone())?
        .merge(common_routes(state))
        .merge(openapi_routes(doc));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
