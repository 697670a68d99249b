//! Products domain module.
//!
//! This crate contains the business rules for the product catalog and the
//! purchase (stock decrement) rule, implemented purely as deterministic domain
//! logic (no IO, no storage).

pub mod product;

pub use product::{Product, PurchasePlan};
