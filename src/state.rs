//! Shared application state for generated routes.

use crate::store::ModelStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ModelStore>,
}

impl AppState {
    pub fn new(store: impl ModelStore + 'static) -> Self {
        AppState {
            store: Arc::new(store),
        }
    }
}
