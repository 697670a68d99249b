//! sqlx-backed catalog store.
//!
//! One store type fronts both compiled-in drivers; the connection URL picks
//! the backend:
//!
//! | URL                                   | Backend |
//! |---------------------------------------|---------|
//! | `mysql://…`, `mariadb://…`            | MySQL   |
//! | `jdbc:mysql://…`                      | MySQL (the `jdbc:` prefix is dropped) |
//! | `sqlite:…`                            | SQLite  |
//! | anything else                         | `DriverUnavailable` |
//!
//! ## Error Mapping
//!
//! | SQLx Error              | StoreError |
//! |-------------------------|------------|
//! | `PoolTimedOut`          | `Timeout`  |
//! | `Database`              | `Backend` (message and code) |
//! | `ColumnDecode`/`Decode` | `Backend` (undecodable row) |
//! | anything else           | `Backend`  |
//!
//! Every call is additionally wrapped in the configured query timeout.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::instrument;

use storefront_core::ProductId;
use storefront_products::{Product, PurchasePlan};

use super::r#trait::{CatalogStore, StoreError};
use super::{mysql, sqlite};
use crate::config::DatabaseConfig;

pub(super) const SELECT_PRODUCTS: &str = "SELECT id, name, price, stock FROM products";
pub(super) const UPDATE_STOCK: &str = "UPDATE products SET stock = ? WHERE id = ? AND stock = ?";
pub(super) const SELECT_STOCK: &str = "SELECT stock FROM products WHERE id = ?";
pub(super) const PING: &str = "SELECT 1";

/// Backend family selected from the connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    MySql,
    Sqlite,
}

impl BackendKind {
    /// Detect the backend and return the URL in the form sqlx expects.
    pub fn detect(url: &str) -> Result<(Self, String), StoreError> {
        let url = url.trim();
        let url = url.strip_prefix("jdbc:").unwrap_or(url);

        if url.starts_with("mysql://") {
            Ok((Self::MySql, url.to_string()))
        } else if let Some(rest) = url.strip_prefix("mariadb://") {
            Ok((Self::MySql, format!("mysql://{rest}")))
        } else if url.starts_with("sqlite:") {
            Ok((Self::Sqlite, url.to_string()))
        } else {
            let scheme = url.split(':').next().unwrap_or(url);
            Err(StoreError::DriverUnavailable(scheme.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

#[derive(Debug, Clone)]
enum Backend {
    MySql(MySqlPool),
    Sqlite(SqlitePool),
    /// No driver for the configured URL; every call fails with `DriverUnavailable`.
    Unavailable(String),
}

/// Catalog store over a sqlx connection pool.
///
/// Pools are created lazily: constructing the store never touches the network,
/// so an unreachable backend only surfaces on the first call (or `ping`).
#[derive(Debug, Clone)]
pub struct SqlCatalogStore {
    backend: Backend,
    timeout: Duration,
}

impl SqlCatalogStore {
    /// Build a store from configuration without connecting.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let (kind, url) = BackendKind::detect(&config.url)?;
        let timeout = config.query_timeout;

        let backend = match kind {
            BackendKind::MySql => {
                let mut options = MySqlConnectOptions::from_str(&url)
                    .map_err(|e| map_sqlx_error("configure", e, timeout))?;
                if !config.user.is_empty() {
                    options = options.username(&config.user);
                }
                if !config.password.is_empty() {
                    options = options.password(&config.password);
                }
                Backend::MySql(
                    MySqlPoolOptions::new()
                        .max_connections(config.max_connections)
                        .acquire_timeout(timeout)
                        .connect_lazy_with(options),
                )
            }
            BackendKind::Sqlite => {
                let options = SqliteConnectOptions::from_str(&url)
                    .map_err(|e| map_sqlx_error("configure", e, timeout))?;
                Backend::Sqlite(
                    SqlitePoolOptions::new()
                        .max_connections(config.max_connections)
                        .acquire_timeout(timeout)
                        .connect_lazy_with(options),
                )
            }
        };

        Ok(Self { backend, timeout })
    }

    /// A store whose every call fails with `DriverUnavailable`.
    pub fn unavailable(scheme: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend: Backend::Unavailable(scheme.into()),
            timeout,
        }
    }

    pub fn from_mysql_pool(pool: MySqlPool, timeout: Duration) -> Self {
        Self {
            backend: Backend::MySql(pool),
            timeout,
        }
    }

    pub fn from_sqlite_pool(pool: SqlitePool, timeout: Duration) -> Self {
        Self {
            backend: Backend::Sqlite(pool),
            timeout,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::MySql(_) => BackendKind::MySql.as_str(),
            Backend::Sqlite(_) => BackendKind::Sqlite.as_str(),
            Backend::Unavailable(_) => "unavailable",
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let products = match &self.backend {
            Backend::MySql(pool) => {
                self.bounded(mysql::list_products(pool, self.timeout)).await?
            }
            Backend::Sqlite(pool) => {
                self.bounded(sqlite::list_products(pool, self.timeout)).await?
            }
            Backend::Unavailable(scheme) => {
                return Err(StoreError::DriverUnavailable(scheme.clone()));
            }
        };

        tracing::debug!(backend = self.backend_name(), rows = products.len(), "catalog read");
        Ok(products)
    }

    #[instrument(
        skip(self, plan),
        fields(
            product_id = %plan.product_id(),
            expected_stock = plan.expected_stock(),
        ),
        err
    )]
    async fn apply_purchase(&self, plan: &PurchasePlan) -> Result<(), StoreError> {
        match &self.backend {
            Backend::MySql(pool) => {
                self.bounded(mysql::apply_purchase(pool, plan, self.timeout))
                    .await
            }
            Backend::Sqlite(pool) => {
                self.bounded(sqlite::apply_purchase(pool, plan, self.timeout))
                    .await
            }
            Backend::Unavailable(scheme) => Err(StoreError::DriverUnavailable(scheme.clone())),
        }
    }

    #[instrument(skip(self), err)]
    async fn ping(&self) -> Result<(), StoreError> {
        match &self.backend {
            Backend::MySql(pool) => self.bounded(mysql::ping(pool, self.timeout)).await,
            Backend::Sqlite(pool) => self.bounded(sqlite::ping(pool, self.timeout)).await,
            Backend::Unavailable(scheme) => Err(StoreError::DriverUnavailable(scheme.clone())),
        }
    }
}

/// Turn a decoded `products` row into a domain product.
pub(super) fn product_from_columns(
    id: i64,
    name: String,
    price: Decimal,
    stock: i64,
) -> Result<Product, StoreError> {
    let stock = u32::try_from(stock).map_err(|_| {
        StoreError::Backend(format!("product {id} has an invalid stock value ({stock})"))
    })?;

    Product::new(ProductId::new(id), name, price, stock)
        .map_err(|e| StoreError::Backend(e.to_string()))
}

/// Prices stored as floating point columns (`DOUBLE`, `REAL`).
pub(super) fn price_from_f64(id: i64, raw: f64) -> Result<Decimal, StoreError> {
    Decimal::try_from(raw)
        .map(|price| price.normalize())
        .map_err(|e| StoreError::Backend(format!("product {id} has an invalid price ({raw}): {e}")))
}

/// Resolve a conditional update that touched no row.
pub(super) fn unmatched_purchase(plan: &PurchasePlan, current_stock: Option<i64>) -> StoreError {
    match current_stock {
        None => StoreError::NotFound(plan.product_id()),
        Some(actual) => StoreError::StockChanged {
            product_id: plan.product_id(),
            expected: plan.expected_stock(),
            actual,
        },
    }
}

pub(super) fn map_sqlx_error(operation: &str, err: sqlx::Error, timeout: Duration) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(timeout),
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned());
            match code {
                Some(code) => StoreError::Backend(format!(
                    "database error in {operation} ({code}): {}",
                    db_err.message()
                )),
                None => StoreError::Backend(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                )),
            }
        }
        sqlx::Error::ColumnDecode { index, source } => StoreError::Backend(format!(
            "failed to decode column {index} in {operation}: {source}"
        )),
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}
