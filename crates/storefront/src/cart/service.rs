//! Cart engine operations.

use std::sync::Arc;

use tracing::instrument;

use bazaar_core::{CurrencyCode, ProductId, UserId};

use super::catalog::CatalogLookup;
use super::error::CartError;
use super::model::Cart;
use super::snapshot::CartSnapshot;
use super::store::{CartStore, IfAbsent};

/// Default per-line quantity ceiling.
pub const DEFAULT_MAX_LINE_QUANTITY: i32 = 9999;

/// The cart consistency engine.
///
/// Holds no per-request state. Every mutation validates its input, checks the
/// item against the catalog, then hands a single closure to
/// [`CartStore::modify`] so the read-modify-write is atomic.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogLookup>,
    currency: CurrencyCode,
    max_line_quantity: i32,
}

impl CartService {
    /// Create an engine over `store` and `catalog`.
    #[must_use]
    pub fn new(
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogLookup>,
        currency: CurrencyCode,
        max_line_quantity: i32,
    ) -> Self {
        Self {
            store,
            catalog,
            currency,
            max_line_quantity,
        }
    }

    /// Add `quantity` units of `item_id` to the owner's cart, creating the
    /// cart if needed. Repeated adds of the same item accumulate.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity < 1`
    /// - `QuantityExceedsLimit` if the line would exceed the ceiling
    /// - `ItemNotFound` if the item does not resolve in the catalog
    /// - `Store` if the catalog or store fails
    #[instrument(skip(self), fields(owner_id = %owner, item_id = %item_id))]
    pub async fn add(
        &self,
        owner: UserId,
        item_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let quantity = self.within_ceiling(quantity)?;
        self.require_item(item_id).await?;

        let max = self.max_line_quantity;
        let cart = self
            .store
            .modify(
                owner,
                IfAbsent::Create,
                Box::new(move |cart| cart.merge_line(item_id, quantity, max)),
            )
            .await?;

        tracing::info!(lines = cart.items.len(), "Item added to cart");
        Ok(cart)
    }

    /// Set the owner's line for `item_id` to exactly `quantity`. Zero removes
    /// the line.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity < 0`
    /// - `QuantityExceedsLimit` if `quantity` exceeds the ceiling
    /// - `ItemNotFound` if the item does not resolve in the catalog
    /// - `CartNotFound` if the owner has no cart
    /// - `LineNotFound` if the item is not in the cart
    /// - `Store` if the catalog or store fails
    #[instrument(skip(self), fields(owner_id = %owner, item_id = %item_id))]
    pub async fn update_quantity(
        &self,
        owner: UserId,
        item_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let quantity = self.within_ceiling(quantity)?;
        self.require_item(item_id).await?;

        let max = self.max_line_quantity;
        let cart = self
            .store
            .modify(
                owner,
                IfAbsent::Fail,
                Box::new(move |cart| cart.set_line_quantity(item_id, quantity, max)),
            )
            .await?;

        tracing::info!(lines = cart.items.len(), "Cart line updated");
        Ok(cart)
    }

    /// Remove the owner's line for `item_id`.
    ///
    /// # Errors
    ///
    /// - `ItemNotFound` if the item does not resolve in the catalog
    /// - `CartNotFound` if the owner has no cart
    /// - `LineNotFound` if the item is not in the cart
    /// - `Store` if the catalog or store fails
    #[instrument(skip(self), fields(owner_id = %owner, item_id = %item_id))]
    pub async fn remove(&self, owner: UserId, item_id: ProductId) -> Result<Cart, CartError> {
        self.require_item(item_id).await?;

        let cart = self
            .store
            .modify(
                owner,
                IfAbsent::Fail,
                Box::new(move |cart| cart.remove_line(item_id).map(|_| ())),
            )
            .await?;

        tracing::info!(lines = cart.items.len(), "Cart line removed");
        Ok(cart)
    }

    /// Price the owner's cart against the live catalog.
    ///
    /// An owner without a cart, or with an empty one, gets an empty snapshot
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the catalog or store fails.
    #[instrument(skip(self), fields(owner_id = %owner))]
    pub async fn snapshot(&self, owner: UserId) -> Result<CartSnapshot, CartError> {
        let Some(cart) = self.store.load_by_owner(owner).await? else {
            return Ok(CartSnapshot::empty(owner, None, self.currency));
        };
        if cart.is_empty() {
            return Ok(CartSnapshot::empty(owner, Some(cart.id), self.currency));
        }

        let ids: Vec<ProductId> = cart.items.iter().map(|line| line.item_id).collect();
        let prices = self.catalog.get_many(&ids).await?;
        let snapshot = CartSnapshot::price(&cart, &prices, self.currency)?;

        if snapshot.is_partial() {
            tracing::warn!(
                unavailable = ?snapshot.unavailable_items(),
                "Cart references items missing from the catalog"
            );
        }

        Ok(snapshot)
    }

    fn within_ceiling(&self, quantity: i64) -> Result<i32, CartError> {
        i32::try_from(quantity)
            .ok()
            .filter(|quantity| *quantity <= self.max_line_quantity)
            .ok_or(CartError::QuantityExceedsLimit {
                requested: quantity,
                max: self.max_line_quantity,
            })
    }

    async fn require_item(&self, item_id: ProductId) -> Result<(), CartError> {
        match self.catalog.get(item_id).await? {
            Some(_) => Ok(()),
            None => Err(CartError::ItemNotFound(item_id)),
        }
    }
}

impl std::fmt::Debug for CartService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartService")
            .field("currency", &self.currency)
            .field("max_line_quantity", &self.max_line_quantity)
            .finish_non_exhaustive()
    }
}
