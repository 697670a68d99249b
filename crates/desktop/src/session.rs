//! Display-side session: the rendered snapshot, the current selection and the
//! buy flow.
//!
//! Validation (no selection, out of stock) happens here, before the service is
//! called. A failed catalog read never clears the snapshot already on screen.

use tracing::{info, warn};

use storefront_core::ProductId;
use storefront_infra::{CatalogStore, StoreError};
use storefront_products::Product;

use crate::error::AppError;
use crate::service::CatalogService;

/// The user's answer to "Do you want to buy …?".
pub trait Confirm {
    fn confirm_purchase(&mut self, product: &Product) -> bool;
}

/// Always answers yes (non-interactive `--yes` purchases).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm_purchase(&mut self, _product: &Product) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Stock was decremented. `product` is the row as it was when confirmed.
    Purchased {
        product: Product,
        /// Set when the follow-up catalog read failed; the snapshot is stale.
        refresh_error: Option<AppError>,
    },
    /// The user declined the confirmation; nothing was sent to the backend.
    Cancelled,
}

pub struct Storefront<S> {
    service: CatalogService<S>,
    snapshot: Vec<Product>,
    selected: Option<ProductId>,
}

impl<S: CatalogStore> Storefront<S> {
    /// A session with an empty snapshot; call [`Storefront::refresh`] to populate it.
    pub fn new(service: CatalogService<S>) -> Self {
        Self {
            service,
            snapshot: Vec::new(),
            selected: None,
        }
    }

    pub fn service(&self) -> &CatalogService<S> {
        &self.service
    }

    pub fn snapshot(&self) -> &[Product] {
        &self.snapshot
    }

    pub fn selected(&self) -> Option<&Product> {
        let id = self.selected?;
        self.snapshot.iter().find(|p| p.id() == id)
    }

    /// Replace the snapshot with a fresh catalog read.
    ///
    /// On failure the previous snapshot (and selection) stay as they were.
    pub async fn refresh(&mut self) -> Result<&[Product], AppError> {
        let products = self.service.list_products().await?;
        self.snapshot = products;

        if let Some(id) = self.selected {
            if !self.snapshot.iter().any(|p| p.id() == id) {
                self.selected = None;
            }
        }

        Ok(&self.snapshot)
    }

    /// Select a row of the current snapshot.
    pub fn select(&mut self, id: ProductId) -> Result<&Product, AppError> {
        let index = self
            .snapshot
            .iter()
            .position(|p| p.id() == id)
            .ok_or(AppError::UnknownProduct(id))?;

        self.selected = Some(id);
        Ok(&self.snapshot[index])
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Buy one unit of the selected product.
    ///
    /// Order of checks: selection, stock, confirmation. The backend is only
    /// reached after all three pass. A successful purchase re-reads the catalog.
    pub async fn buy_selected<C>(&mut self, confirm: &mut C) -> Result<PurchaseOutcome, AppError>
    where
        C: Confirm + ?Sized,
    {
        let product = self.selected().cloned().ok_or(AppError::NoSelection)?;

        if !product.is_in_stock() {
            return Err(AppError::OutOfStock {
                name: product.name().to_string(),
            });
        }

        if !confirm.confirm_purchase(&product) {
            info!(product_id = %product.id(), "purchase cancelled");
            return Ok(PurchaseOutcome::Cancelled);
        }

        if let Err(err) = self.service.purchase(product.id(), product.stock()).await {
            if matches!(
                err,
                AppError::Store(StoreError::NotFound(_) | StoreError::StockChanged { .. })
            ) {
                // The snapshot is out of date; show the backend's current view.
                if let Err(refresh_err) = self.refresh().await {
                    warn!(error = %refresh_err, "catalog refresh after rejected purchase failed");
                }
            }
            return Err(err);
        }

        let refresh_error = match self.refresh().await {
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "catalog refresh after purchase failed");
                Some(err)
            }
        };

        Ok(PurchaseOutcome::Purchased {
            product,
            refresh_error,
        })
    }

    /// Select `id` and buy it.
    pub async fn buy<C>(&mut self, id: ProductId, confirm: &mut C) -> Result<PurchaseOutcome, AppError>
    where
        C: Confirm + ?Sized,
    {
        self.select(id)?;
        self.buy_selected(confirm).await
    }
}
