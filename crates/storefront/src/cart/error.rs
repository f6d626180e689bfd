//! Cart engine error types.

use thiserror::Error;

use bazaar_core::ProductId;

use crate::db::RepositoryError;

/// Errors produced by cart engine operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Requested quantity is out of range for the operation.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Resulting line quantity would exceed the per-line ceiling.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityExceedsLimit { requested: i64, max: i32 },

    /// Item does not resolve in the catalog.
    #[error("product not found: {0}")]
    ItemNotFound(ProductId),

    /// Owner has no cart.
    #[error("cart not found")]
    CartNotFound,

    /// Item is not a line item of the owner's cart.
    #[error("product not found in cart: {0}")]
    LineNotFound(ProductId),

    /// Catalog or cart store failed.
    #[error("storage error: {0}")]
    Store(#[from] RepositoryError),
}

/// Coarse classification of a [`CartError`] for callers that map errors to
/// transport statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Referenced item, cart, or line item is absent.
    NotFound,
    /// Catalog or store unreachable or failing.
    Dependency,
}

impl CartError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuantity(_) | Self::QuantityExceedsLimit { .. } => ErrorKind::Validation,
            Self::ItemNotFound(_) | Self::CartNotFound | Self::LineNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Store(_) => ErrorKind::Dependency,
        }
    }

    /// Message safe to show to API clients.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidQuantity(_) => "Quantity must be a positive integer.".to_owned(),
            Self::QuantityExceedsLimit { max, .. } => {
                format!("Quantity cannot exceed {max} per item.")
            }
            Self::ItemNotFound(_) => "Product not found".to_owned(),
            Self::CartNotFound => "Cart not found".to_owned(),
            Self::LineNotFound(_) => "Product not found in cart".to_owned(),
            Self::Store(_) => "Service temporarily unavailable".to_owned(),
        }
    }
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(RepositoryError::Database(err))
    }
}
