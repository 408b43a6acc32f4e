//! CrudService: record operations behind every generated handler.

mod crud;
pub use crud::CrudService;
