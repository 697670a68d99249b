use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, ProductId};

/// A catalog row: one purchasable product and its current stock.
///
/// Instances are snapshots of backend state. They are never mutated in place;
/// a purchase goes through [`PurchasePlan`] and the caller re-reads the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Decimal,
    stock: u32,
}

impl Product {
    /// Build a product, rejecting negative prices.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Decimal,
        stock: u32,
    ) -> DomainResult<Self> {
        if price < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "product {id} has a negative price ({price})"
            )));
        }

        Ok(Self {
            id,
            name: name.into(),
            price,
            stock,
        })
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Copy of this product with a different stock level.
    pub fn with_stock(&self, stock: u32) -> Self {
        Self {
            stock,
            ..self.clone()
        }
    }

    /// Plan the purchase of one unit of this product.
    ///
    /// Fails with a validation error when the product is out of stock; no
    /// backend call may be attempted in that case.
    pub fn plan_purchase(&self) -> DomainResult<PurchasePlan> {
        if !self.is_in_stock() {
            return Err(DomainError::validation(format!(
                "{} is out of stock",
                self.name
            )));
        }
        PurchasePlan::new(self.id, self.stock)
    }
}

/// A single-unit stock decrement: `expected_stock -> expected_stock - 1`.
///
/// The only way to obtain one guarantees `expected_stock > 0`, so stores can
/// apply it without re-checking the lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasePlan {
    product_id: ProductId,
    expected_stock: u32,
    new_stock: u32,
}

impl PurchasePlan {
    pub fn new(product_id: ProductId, expected_current_stock: u32) -> DomainResult<Self> {
        let new_stock = expected_current_stock.checked_sub(1).ok_or_else(|| {
            DomainError::invariant(format!(
                "stock of product {product_id} cannot go below zero"
            ))
        })?;

        Ok(Self {
            product_id,
            expected_stock: expected_current_stock,
            new_stock,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn expected_stock(&self) -> u32 {
        self.expected_stock
    }

    pub fn new_stock(&self) -> u32 {
        self.new_stock
    }
}
