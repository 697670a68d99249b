//! Infrastructure layer: configuration and catalog persistence.

pub mod config;
pub mod store;

pub use config::{AppConfig, ConfigError, DatabaseConfig};
pub use store::{BackendKind, CatalogStore, InMemoryCatalogStore, SqlCatalogStore, StoreError};
