//! User-facing error model for the client.

use thiserror::Error;

use storefront_core::{DomainError, ProductId};
use storefront_infra::StoreError;

/// Errors surfaced to the user by the catalog session.
///
/// Validation variants never involve a backend call. Backend failures are
/// carried unchanged in `Store` and are never fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please select a product to buy.")]
    NoSelection,

    #[error("Product {0} is not in the current catalog.")]
    UnknownProduct(ProductId),

    #[error("Sorry, {name} is out of stock.")]
    OutOfStock { name: String },

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Short heading for the message (the dialog title in a windowed UI).
    pub fn title(&self) -> &'static str {
        match self {
            AppError::NoSelection | AppError::UnknownProduct(_) | AppError::Validation(_) => "Error",
            AppError::OutOfStock { .. } => "Out of Stock",
            AppError::Store(_) => "Database Error",
        }
    }

    /// True for local failures raised before any backend interaction.
    pub fn is_validation(&self) -> bool {
        !matches!(self, AppError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_match_the_dialog_texts() {
        assert_eq!(AppError::NoSelection.to_string(), "Please select a product to buy.");
        assert_eq!(
            AppError::OutOfStock { name: "Mug".to_string() }.to_string(),
            "Sorry, Mug is out of stock."
        );
    }

    #[test]
    fn store_errors_are_database_errors() {
        let err = AppError::from(StoreError::Backend("connection refused".to_string()));
        assert_eq!(err.title(), "Database Error");
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "backend error: connection refused");
    }

    #[test]
    fn out_of_stock_is_a_validation_error() {
        let err = AppError::OutOfStock { name: "Mug".to_string() };
        assert_eq!(err.title(), "Out of Stock");
        assert!(err.is_validation());
    }
}
