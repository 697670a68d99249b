//! SQLite statements for the catalog store.

use std::time::Duration;

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use storefront_products::{Product, PurchasePlan};

use super::r#trait::StoreError;
use super::sql::{
    map_sqlx_error, price_from_f64, product_from_columns, unmatched_purchase, PING,
    SELECT_PRODUCTS, SELECT_STOCK, UPDATE_STOCK,
};

pub(super) async fn list_products(
    pool: &SqlitePool,
    timeout: Duration,
) -> Result<Vec<Product>, StoreError> {
    let rows = sqlx::query(SELECT_PRODUCTS)
        .fetch_all(pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e, timeout))?;

    rows.iter()
        .map(|row| product_from_row(row, timeout))
        .collect()
}

pub(super) async fn apply_purchase(
    pool: &SqlitePool,
    plan: &PurchasePlan,
    timeout: Duration,
) -> Result<(), StoreError> {
    let result = sqlx::query(UPDATE_STOCK)
        .bind(i64::from(plan.new_stock()))
        .bind(plan.product_id().get())
        .bind(i64::from(plan.expected_stock()))
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_purchase", e, timeout))?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    let current: Option<i64> = sqlx::query_scalar(SELECT_STOCK)
        .bind(plan.product_id().get())
        .fetch_optional(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_purchase", e, timeout))?;

    Err(unmatched_purchase(plan, current))
}

pub(super) async fn ping(pool: &SqlitePool, timeout: Duration) -> Result<(), StoreError> {
    sqlx::query(PING)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ping", e, timeout))?;
    Ok(())
}

fn product_from_row(row: &SqliteRow, timeout: Duration) -> Result<Product, StoreError> {
    let decode = |e| map_sqlx_error("list_products", e, timeout);

    let id: i64 = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let stock: i64 = row.try_get("stock").map_err(decode)?;

    // SQLite has no decimal type: prices live in REAL (or INTEGER) columns.
    let raw = match row.try_get::<f64, _>("price") {
        Ok(raw) => raw,
        Err(_) => row.try_get::<i64, _>("price").map_err(decode)? as f64,
    };
    let price = price_from_f64(id, raw)?;

    product_from_columns(id, name, price, stock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sqlx::sqlite::SqlitePoolOptions;
    use storefront_core::ProductId;

    use crate::store::{CatalogStore, SqlCatalogStore};

    async fn pool_with(rows: &[(i64, &str, f64, i64)]) -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE products (
                id    INTEGER PRIMARY KEY,
                name  TEXT    NOT NULL,
                price REAL    NOT NULL,
                stock INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        for (id, name, price, stock) in rows {
            sqlx::query("INSERT INTO products (id, name, price, stock) VALUES (?, ?, ?, ?)")
                .bind(*id)
                .bind(*name)
                .bind(*price)
                .bind(*stock)
                .execute(&pool)
                .await
                .unwrap();
        }

        pool
    }

    fn store(pool: SqlitePool) -> SqlCatalogStore {
        SqlCatalogStore::from_sqlite_pool(pool, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn reads_all_four_columns() {
        let store = store(pool_with(&[(1, "Pen", 10.0, 5), (2, "Mug", 50.0, 0)]).await);

        let products = store.list_products().await.unwrap();

        assert_eq!(
            products,
            vec![
                Product::new(ProductId::new(1), "Pen", Decimal::new(10, 0), 5).unwrap(),
                Product::new(ProductId::new(2), "Mug", Decimal::new(50, 0), 0).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_catalog_lists_nothing() {
        let store = store(pool_with(&[]).await);
        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn purchase_writes_expected_minus_one() {
        let store = store(pool_with(&[(1, "Pen", 10.0, 5), (3, "Lamp", 99.5, 2)]).await);

        let plan = PurchasePlan::new(ProductId::new(1), 5).unwrap();
        store.apply_purchase(&plan).await.unwrap();

        let products = store.list_products().await.unwrap();
        assert_eq!(products[0].stock(), 4);
        assert_eq!(products[1].stock(), 2);
        assert_eq!(products[1].price(), Decimal::new(995, 1));
    }

    #[tokio::test]
    async fn purchase_of_missing_row_is_not_found() {
        let store = store(pool_with(&[(1, "Pen", 10.0, 5)]).await);

        let plan = PurchasePlan::new(ProductId::new(99), 1).unwrap();
        let err = store.apply_purchase(&plan).await.unwrap_err();

        assert_eq!(err, StoreError::NotFound(ProductId::new(99)));
        assert_eq!(store.list_products().await.unwrap()[0].stock(), 5);
    }

    #[tokio::test]
    async fn purchase_against_changed_stock_is_rejected() {
        let pool = pool_with(&[(1, "Pen", 10.0, 5)]).await;
        let store = store(pool.clone());

        // Another client sells two units after our snapshot was taken.
        sqlx::query("UPDATE products SET stock = 3 WHERE id = 1")
            .execute(&pool)
            .await
            .unwrap();

        let plan = PurchasePlan::new(ProductId::new(1), 5).unwrap();
        let err = store.apply_purchase(&plan).await.unwrap_err();

        assert_eq!(
            err,
            StoreError::StockChanged {
                product_id: ProductId::new(1),
                expected: 5,
                actual: 3,
            }
        );
        assert_eq!(store.list_products().await.unwrap()[0].stock(), 3);
    }

    #[tokio::test]
    async fn missing_table_is_a_backend_error() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = store(pool);

        match store.list_products().await {
            Err(StoreError::Backend(msg)) => assert!(msg.contains("list_products"), "{msg}"),
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn busy_pool_times_out_instead_of_hanging() {
        let pool = pool_with(&[(1, "Pen", 10.0, 5)]).await;
        let bound = Duration::from_millis(300);
        let store = SqlCatalogStore::from_sqlite_pool(pool.clone(), bound);

        // The pool's only connection is checked out elsewhere.
        let held = pool.acquire().await.unwrap();

        assert_eq!(store.list_products().await.unwrap_err(), StoreError::Timeout(bound));
        let plan = PurchasePlan::new(ProductId::new(1), 5).unwrap();
        assert_eq!(store.apply_purchase(&plan).await.unwrap_err(), StoreError::Timeout(bound));

        drop(held);
        assert_eq!(store.list_products().await.unwrap()[0].stock(), 5);
    }

    #[tokio::test]
    async fn ping_succeeds_on_open_pool() {
        let store = store(pool_with(&[]).await);
        store.ping().await.unwrap();
    }
}
