use std::sync::RwLock;

use async_trait::async_trait;

use storefront_products::{Product, PurchasePlan};

use super::r#trait::{CatalogStore, StoreError};

/// In-memory catalog for tests/dev.
///
/// Rows keep insertion order, which plays the role of "backend order".
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    rows: RwLock<Vec<Product>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            rows: RwLock::new(products.into_iter().collect()),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory catalog lock poisoned".to_string())
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.clone())
    }

    async fn apply_purchase(&self, plan: &PurchasePlan) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;

        let row = rows
            .iter_mut()
            .find(|p| p.id() == plan.product_id())
            .ok_or(StoreError::NotFound(plan.product_id()))?;

        if row.stock() != plan.expected_stock() {
            return Err(StoreError::StockChanged {
                product_id: plan.product_id(),
                expected: plan.expected_stock(),
                actual: i64::from(row.stock()),
            });
        }

        *row = row.with_stock(plan.new_stock());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storefront_core::ProductId;

    fn product(id: i64, name: &str, price: i64, stock: u32) -> Product {
        Product::new(ProductId::new(id), name, Decimal::new(price, 0), stock).unwrap()
    }

    fn store() -> InMemoryCatalogStore {
        InMemoryCatalogStore::with_products([
            product(1, "Pen", 10, 5),
            product(2, "Mug", 50, 0),
            product(3, "Lamp", 900, 2),
        ])
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let ids: Vec<i64> = store()
            .list_products()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id().get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn purchase_updates_only_the_target_row() {
        let store = store();
        let before = store.list_products().await.unwrap();

        let plan = before[0].plan_purchase().unwrap();
        store.apply_purchase(&plan).await.unwrap();

        let after = store.list_products().await.unwrap();
        assert_eq!(after[0].stock(), 4);
        assert_eq!(after[1..], before[1..]);
    }

    #[tokio::test]
    async fn purchase_of_unknown_id_is_not_found() {
        let plan = PurchasePlan::new(ProductId::new(404), 3).unwrap();
        let err = store().apply_purchase(&plan).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound(ProductId::new(404)));
    }

    #[tokio::test]
    async fn stale_plan_is_rejected_without_writing() {
        let store = store();
        let plan = PurchasePlan::new(ProductId::new(3), 2).unwrap();

        store.apply_purchase(&plan).await.unwrap();
        let err = store.apply_purchase(&plan).await.unwrap_err();

        assert_eq!(
            err,
            StoreError::StockChanged {
                product_id: ProductId::new(3),
                expected: 2,
                actual: 1,
            }
        );
        assert_eq!(store.list_products().await.unwrap()[2].stock(), 1);
    }
}
