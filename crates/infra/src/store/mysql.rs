//! MySQL statements for the catalog store.
//!
//! The statements and the unmatched-update resolution are shared with
//! `sqlite.rs` through `sql.rs`; the SQLite tests cover that flow end to end.
//! What differs here is column decoding: MySQL schemas commonly use `DECIMAL`
//! prices and `INT UNSIGNED` keys and stock counts.

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;

use storefront_products::{Product, PurchasePlan};

use super::r#trait::StoreError;
use super::sql::{
    map_sqlx_error, price_from_f64, product_from_columns, unmatched_purchase, PING,
    SELECT_PRODUCTS, SELECT_STOCK, UPDATE_STOCK,
};

pub(super) async fn list_products(
    pool: &MySqlPool,
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
    pool: &MySqlPool,
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

    let current = sqlx::query(SELECT_STOCK)
        .bind(plan.product_id().get())
        .fetch_optional(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_purchase", e, timeout))?
        .map(|row| integer_column(&row, "stock", "apply_purchase", timeout))
        .transpose()?;

    Err(unmatched_purchase(plan, current))
}

pub(super) async fn ping(pool: &MySqlPool, timeout: Duration) -> Result<(), StoreError> {
    sqlx::query(PING)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ping", e, timeout))?;
    Ok(())
}

fn product_from_row(row: &MySqlRow, timeout: Duration) -> Result<Product, StoreError> {
    let decode = |e| map_sqlx_error("list_products", e, timeout);

    let id = integer_column(row, "id", "list_products", timeout)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let stock = integer_column(row, "stock", "list_products", timeout)?;

    // DECIMAL columns decode directly; DOUBLE/FLOAT columns go through f64.
    let price = match row.try_get::<Decimal, _>("price") {
        Ok(price) => price,
        Err(_) => {
            let raw: f64 = row.try_get("price").map_err(decode)?;
            price_from_f64(id, raw)?
        }
    };

    product_from_columns(id, name, price, stock)
}

/// Signed columns decode as `i64`; `UNSIGNED` ones only as `u64`.
fn integer_column(
    row: &MySqlRow,
    column: &str,
    operation: &str,
    timeout: Duration,
) -> Result<i64, StoreError> {
    widen_integer(
        row.try_get::<i64, _>(column),
        || row.try_get::<u64, _>(column),
        column,
        operation,
        timeout,
    )
}

fn widen_integer(
    signed: Result<i64, sqlx::Error>,
    unsigned: impl FnOnce() -> Result<u64, sqlx::Error>,
    column: &str,
    operation: &str,
    timeout: Duration,
) -> Result<i64, StoreError> {
    if let Ok(value) = signed {
        return Ok(value);
    }

    let value = unsigned().map_err(|e| map_sqlx_error(operation, e, timeout))?;
    i64::try_from(value).map_err(|_| {
        StoreError::Backend(format!("column {column} value {value} is out of range"))
    })
}
