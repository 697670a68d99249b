//! Catalog persistence boundary.
//!
//! The `CatalogStore` trait is the only seam between the application layer and
//! the backing relational store. Implementations:
//!
//! - [`InMemoryCatalogStore`] for tests/dev
//! - [`SqlCatalogStore`] for MySQL and SQLite via sqlx

pub mod in_memory;
mod mysql;
pub mod sql;
mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryCatalogStore;
pub use r#trait::{CatalogStore, StoreError};
pub use sql::{BackendKind, SqlCatalogStore};
