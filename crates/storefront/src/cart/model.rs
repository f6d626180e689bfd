//! Cart aggregate.
//!
//! A cart holds at most one line per catalog item and every stored line has a
//! quantity of at least one. The mutation methods below are the only way the
//! engine changes a cart, and each keeps both invariants.

use chrono::{DateTime, Utc};

use bazaar_core::{CartId, ProductId, UserId};

use super::error::CartError;

/// One `(item, quantity)` pair within a cart.
///
/// The line references the catalog item by id only; prices are never copied
/// into the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLineItem {
    /// Catalog item this line refers to.
    pub item_id: ProductId,
    /// Number of units, always `>= 1`.
    pub quantity: i32,
}

/// The single cart belonging to an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub owner_id: UserId,
    /// Lines in insertion order, unique by `item_id`.
    pub items: Vec<CartLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// A freshly created cart with no lines.
    #[must_use]
    pub const fn empty(id: CartId, owner_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            owner_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The line for `item_id`, if present.
    #[must_use]
    pub fn line(&self, item_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|line| line.item_id == item_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|line| i64::from(line.quantity)).sum()
    }

    /// Add `quantity` units of `item_id`, accumulating onto an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 1`, and
    /// `CartError::QuantityExceedsLimit` if the resulting line quantity would
    /// exceed `max`. The cart is unchanged on error.
    pub fn merge_line(
        &mut self,
        item_id: ProductId,
        quantity: i32,
        max: i32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(i64::from(quantity)));
        }

        if let Some(line) = self.items.iter_mut().find(|line| line.item_id == item_id) {
            let requested = i64::from(line.quantity) + i64::from(quantity);
            let merged = line
                .quantity
                .checked_add(quantity)
                .filter(|merged| *merged <= max)
                .ok_or(CartError::QuantityExceedsLimit { requested, max })?;
            line.quantity = merged;
            return Ok(());
        }

        if quantity > max {
            return Err(CartError::QuantityExceedsLimit {
                requested: i64::from(quantity),
                max,
            });
        }

        self.items.push(CartLineItem { item_id, quantity });
        Ok(())
    }

    /// Set the line for `item_id` to exactly `quantity`; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 0`,
    /// `CartError::QuantityExceedsLimit` if `quantity > max`, and
    /// `CartError::LineNotFound` if the cart has no such line.
    pub fn set_line_quantity(
        &mut self,
        item_id: ProductId,
        quantity: i32,
        max: i32,
    ) -> Result<(), CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity(i64::from(quantity)));
        }
        if quantity > max {
            return Err(CartError::QuantityExceedsLimit {
                requested: i64::from(quantity),
                max,
            });
        }

        if quantity == 0 {
            return self.remove_line(item_id).map(|_| ());
        }

        let line = self
            .items
            .iter_mut()
            .find(|line| line.item_id == item_id)
            .ok_or(CartError::LineNotFound(item_id))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove the line for `item_id`, returning it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the cart has no such line.
    pub fn remove_line(&mut self, item_id: ProductId) -> Result<CartLineItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|line| line.item_id == item_id)
            .ok_or(CartError::LineNotFound(item_id))?;
        Ok(self.items.remove(index))
    }
}
