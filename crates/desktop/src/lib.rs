//! `storefront-desktop`
//!
//! **Responsibility:** the interactive client around the product catalog.
//!
//! This crate provides:
//! - `CatalogService`: the two business operations (list products, purchase)
//! - `Storefront`: the display-side session (snapshot, selection, buy flow)
//! - a terminal front-end that renders the catalog and asks for confirmation
//!
//! UI code only talks to `Storefront`; nothing here touches SQL directly.

pub mod error;
pub mod service;
pub mod session;
pub mod terminal;

pub use error::AppError;
pub use service::CatalogService;
pub use session::{Confirm, PurchaseOutcome, Storefront};
