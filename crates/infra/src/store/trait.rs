use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use storefront_core::ProductId;
use storefront_products::{Product, PurchasePlan};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No compiled-in driver can serve the configured connection URL.
    #[error("no database driver available for `{0}`")]
    DriverUnavailable(String),

    /// Any failure communicating with or executing against the backend.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    /// The purchase update matched no row.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// The row exists but no longer holds the stock the purchase was planned against.
    #[error("stock of product {product_id} changed (expected {expected}, found {actual})")]
    StockChanged {
        product_id: ProductId,
        expected: u32,
        actual: i64,
    },
}

/// Read/update access to the product catalog.
///
/// ## Catalog reads
///
/// `list_products` re-queries on every call and returns rows in backend order.
/// Nothing is cached between calls.
///
/// ## Purchases
///
/// `apply_purchase` sets the product's stock to `plan.new_stock()` only if the
/// row still holds `plan.expected_stock()`. When no row is updated the store
/// reports `NotFound` (no such id) or `StockChanged` (someone else got there
/// first). It never retries.
///
/// ## Resources
///
/// Every call acquires whatever connection it needs and releases it before
/// returning, on success and failure alike.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn apply_purchase(&self, plan: &PurchasePlan) -> Result<(), StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list_products().await
    }

    async fn apply_purchase(&self, plan: &PurchasePlan) -> Result<(), StoreError> {
        (**self).apply_purchase(plan).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}
