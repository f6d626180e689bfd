//! Cart persistence seam.
//!
//! Stores guarantee at most one cart per owner and run every mutation as a
//! single atomic read-modify-write: concurrent mutations of the same cart are
//! serialized by the store, never by the caller.

use async_trait::async_trait;

use bazaar_core::UserId;

use super::error::CartError;
use super::model::Cart;
use crate::db::RepositoryError;

/// In-memory change applied to a loaded cart inside the store's atomic unit.
///
/// Returning an error aborts the unit; nothing is persisted.
pub type CartMutation = Box<dyn FnOnce(&mut Cart) -> Result<(), CartError> + Send>;

/// What [`CartStore::modify`] does when the owner has no cart yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfAbsent {
    /// Create an empty cart and apply the mutation to it.
    Create,
    /// Fail with `CartError::CartNotFound`.
    Fail,
}

/// Persistence for per-owner carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load the owner's cart, if one exists.
    async fn load_by_owner(&self, owner: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Atomically find (or create) the owner's cart, apply `mutation`, and
    /// persist the result. Returns the cart as persisted.
    ///
    /// Exactly one write happens when the mutation succeeds and none when it
    /// fails, including the lazy creation of the cart itself.
    async fn modify(
        &self,
        owner: UserId,
        if_absent: IfAbsent,
        mutation: CartMutation,
    ) -> Result<Cart, CartError>;
}
