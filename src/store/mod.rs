//! Persistence seam for generated handlers.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::config::ModelDescriptor;
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A stored record: field name to JSON value. Relations hold ids.
pub type Record = Map<String, Value>;

/// Per-operation access to the backing store. Each call is independent; no
/// transaction spans calls.
#[async_trait]
pub trait ModelStore: Send + Sync {
    async fn get(&self, model: &ModelDescriptor, id: i64) -> Result<Option<Record>, StoreError>;

    async fn list(&self, model: &ModelDescriptor) -> Result<Vec<Record>, StoreError>;

    /// Insert and return the stored record, including its assigned id.
    async fn create(&self, model: &ModelDescriptor, values: &Record) -> Result<Record, StoreError>;

    /// Write the supplied fields of an existing record.
    async fn update(&self, model: &ModelDescriptor, id: i64, values: &Record) -> Result<(), StoreError>;

    async fn delete(&self, model: &ModelDescriptor, id: i64) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
