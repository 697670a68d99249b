//! Application service: the catalog reader and the purchase processor.

use tracing::{info, instrument};

use storefront_core::ProductId;
use storefront_infra::CatalogStore;
use storefront_products::{Product, PurchasePlan};

use crate::error::AppError;

/// The two business operations, as plain request/response calls.
///
/// Stateless apart from the store handle; each call goes to the backend.
#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the full catalog in backend order.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.store.list_products().await?)
    }

    /// Sell one unit: set stock to `expected_current_stock - 1`.
    ///
    /// Callers must have checked `expected_current_stock > 0`; a zero value is
    /// rejected here before the store is reached.
    #[instrument(skip(self))]
    pub async fn purchase(
        &self,
        product_id: ProductId,
        expected_current_stock: u32,
    ) -> Result<(), AppError> {
        let plan = PurchasePlan::new(product_id, expected_current_stock)?;
        self.store.apply_purchase(&plan).await?;

        info!(%product_id, new_stock = plan.new_stock(), "purchase applied");
        Ok(())
    }

    /// Probe the backend once (used at startup).
    pub async fn check_connection(&self) -> Result<(), AppError> {
        Ok(self.store.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storefront_infra::{InMemoryCatalogStore, StoreError};

    fn service() -> CatalogService<InMemoryCatalogStore> {
        CatalogService::new(InMemoryCatalogStore::with_products([
            Product::new(ProductId::new(1), "Pen", Decimal::new(10, 0), 5).unwrap(),
            Product::new(ProductId::new(2), "Mug", Decimal::new(50, 0), 0).unwrap(),
        ]))
    }

    #[tokio::test]
    async fn listing_twice_returns_identical_snapshots() {
        let service = service();
        let first = service.list_products().await.unwrap();
        let second = service.list_products().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn purchase_then_read_back_shows_exactly_one_less() {
        let service = service();

        service.purchase(ProductId::new(1), 5).await.unwrap();

        let products = service.list_products().await.unwrap();
        assert_eq!(products[0].stock(), 4);
        assert_eq!(products[1].stock(), 0);
    }

    #[tokio::test]
    async fn purchase_with_zero_expected_stock_is_rejected_locally() {
        let err = service().purchase(ProductId::new(2), 0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn purchase_of_unknown_id_is_not_found() {
        let err = service().purchase(ProductId::new(77), 1).await.unwrap_err();
        assert_eq!(err, AppError::Store(StoreError::NotFound(ProductId::new(77))));
    }
}
