//! Read-time cart view priced against the live catalog.
//!
//! Snapshots are never stored. Every read re-resolves each line's current
//! price, so a catalog price change shows up on the next read without any
//! cart mutation.
//!
//! A line whose item has vanished from the catalog stays in the snapshot,
//! flagged as unavailable, with no price. It contributes nothing to the
//! total and marks the snapshot as partial.

use std::collections::HashMap;

use bazaar_core::{CartId, CurrencyCode, Price, ProductId, UserId};

use super::catalog::CatalogItem;
use super::error::CartError;
use super::model::Cart;
use crate::db::RepositoryError;

/// One priced line of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLine {
    pub item_id: ProductId,
    /// Catalog name; `None` when the item no longer resolves.
    pub name: Option<String>,
    pub quantity: i32,
    /// Current unit price; `None` when the item no longer resolves.
    pub unit_price: Option<Price>,
    /// `unit_price × quantity`; `None` when the item no longer resolves.
    pub line_total: Option<Price>,
}

impl SnapshotLine {
    /// Whether the line's item currently resolves in the catalog.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.unit_price.is_some()
    }
}

/// A cart enriched with current prices and a total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub owner_id: UserId,
    /// `None` when the owner has never had a cart.
    pub cart_id: Option<CartId>,
    pub lines: Vec<SnapshotLine>,
    /// Sum of available line totals, rounded to two decimal places.
    pub total_amount: Price,
}

impl CartSnapshot {
    /// The empty-cart result: no lines, zero total.
    #[must_use]
    pub const fn empty(owner_id: UserId, cart_id: Option<CartId>, currency: CurrencyCode) -> Self {
        Self {
            owner_id,
            cart_id,
            lines: Vec::new(),
            total_amount: Price::zero(currency),
        }
    }

    /// Price every line of `cart` using `catalog`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` with a data-corruption cause if a catalog
    /// price is in a different currency or the total is not representable.
    pub fn price(
        cart: &Cart,
        catalog: &HashMap<ProductId, CatalogItem>,
        currency: CurrencyCode,
    ) -> Result<Self, CartError> {
        let mut total = Price::zero(currency);
        let mut lines = Vec::with_capacity(cart.items.len());

        for line in &cart.items {
            let Some(item) = catalog.get(&line.item_id) else {
                lines.push(SnapshotLine {
                    item_id: line.item_id,
                    name: None,
                    quantity: line.quantity,
                    unit_price: None,
                    line_total: None,
                });
                continue;
            };

            let unit_price = item.current_price();
            let line_total = unit_price
                .checked_mul(line.quantity)
                .ok_or_else(|| unrepresentable(line.item_id))?;
            total = total
                .checked_add(line_total)
                .ok_or_else(|| unrepresentable(line.item_id))?;

            lines.push(SnapshotLine {
                item_id: line.item_id,
                name: Some(item.name.clone()),
                quantity: line.quantity,
                unit_price: Some(unit_price),
                line_total: Some(line_total.rounded()),
            });
        }

        Ok(Self {
            owner_id: cart.owner_id,
            cart_id: Some(cart.id),
            lines,
            total_amount: total.rounded(),
        })
    }

    /// Whether the snapshot has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines, available or not.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }

    /// Items that no longer resolve in the catalog.
    #[must_use]
    pub fn unavailable_items(&self) -> Vec<ProductId> {
        self.lines
            .iter()
            .filter(|line| !line.is_available())
            .map(|line| line.item_id)
            .collect()
    }

    /// Whether any line could not be priced.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.lines.iter().any(|line| !line.is_available())
    }
}

fn unrepresentable(item_id: ProductId) -> CartError {
    CartError::Store(RepositoryError::DataCorruption(format!(
        "price of product {item_id} cannot be totalled in the store currency"
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(id: i32, price: &str, discount: Option<&str>) -> CatalogItem {
        CatalogItem::new(
            ProductId::new(id),
            format!("Item {id}"),
            dec(price),
            discount.map(dec),
            CurrencyCode::USD,
        )
    }

    fn cart_with(lines: &[(i32, i32)]) -> Cart {
        let mut cart = Cart::empty(CartId::new(1), UserId::new(7), Utc::now());
        for (id, qty) in lines {
            cart.merge_line(ProductId::new(*id), *qty, 9999).unwrap();
        }
        cart
    }

    fn catalog(items: Vec<CatalogItem>) -> HashMap<ProductId, CatalogItem> {
        items.into_iter().map(|item| (item.id, item)).collect()
    }

    #[test]
    fn test_total_is_sum_of_current_prices() {
        let cart = cart_with(&[(1, 2), (2, 3)]);
        let prices = catalog(vec![item(1, "10.00", Some("7.50")), item(2, "1.99", None)]);

        let snapshot = CartSnapshot::price(&cart, &prices, CurrencyCode::USD).unwrap();

        // 2 × 7.50 + 3 × 1.99
        assert_eq!(snapshot.total_amount.amount, dec("20.97"));
        assert_eq!(snapshot.lines[0].line_total.unwrap().amount, dec("15.00"));
        assert_eq!(snapshot.total_quantity(), 5);
        assert!(!snapshot.is_partial());
    }

    #[test]
    fn test_missing_item_is_flagged_and_excluded() {
        let cart = cart_with(&[(1, 1), (2, 4)]);
        let prices = catalog(vec![item(1, "3.00", None)]);

        let snapshot = CartSnapshot::price(&cart, &prices, CurrencyCode::USD).unwrap();

        assert_eq!(snapshot.total_amount.amount, dec("3.00"));
        assert!(snapshot.is_partial());
        assert_eq!(snapshot.unavailable_items(), vec![ProductId::new(2)]);
        let missing = &snapshot.lines[1];
        assert!(!missing.is_available());
        assert_eq!(missing.quantity, 4);
        assert!(missing.name.is_none());
    }

    #[test]
    fn test_empty_cart_record_prices_to_zero() {
        let cart = cart_with(&[]);
        let snapshot = CartSnapshot::price(&cart, &HashMap::new(), CurrencyCode::USD).unwrap();

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total_amount.amount, Decimal::ZERO);
        assert_eq!(snapshot.cart_id, Some(CartId::new(1)));
    }

    #[test]
    fn test_currency_mismatch_is_an_error() {
        let cart = cart_with(&[(1, 1)]);
        let mut foreign = item(1, "5.00", None);
        foreign.price.currency_code = CurrencyCode::EUR;

        let result = CartSnapshot::price(&cart, &catalog(vec![foreign]), CurrencyCode::USD);
        assert!(matches!(result, Err(CartError::Store(_))));
    }
}
