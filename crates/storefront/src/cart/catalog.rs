//! Catalog lookup seam.
//!
//! The cart engine only needs to know whether an item exists and what it
//! currently sells for. Catalog CRUD lives elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use bazaar_core::{CurrencyCode, Price, ProductId};

use crate::db::RepositoryError;

/// Current sellable attributes of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: ProductId,
    pub name: String,
    /// List price.
    pub price: Price,
    /// Sale price, when the item is discounted.
    pub discount_price: Option<Price>,
}

impl CatalogItem {
    /// Build an item priced in `currency`.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Decimal,
        discount_price: Option<Decimal>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price: Price::new(price, currency),
            discount_price: discount_price.map(|amount| Price::new(amount, currency)),
        }
    }

    /// The price a cart line is charged at: the discount price when set,
    /// otherwise the list price.
    #[must_use]
    pub fn current_price(&self) -> Price {
        self.discount_price.unwrap_or(self.price)
    }
}

/// Resolves item identifiers against the live catalog.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Look up a single item. `Ok(None)` means the item does not exist.
    async fn get(&self, id: ProductId) -> Result<Option<CatalogItem>, RepositoryError>;

    /// Look up several items at once. Missing items are simply absent from
    /// the returned map.
    async fn get_many(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CatalogItem>, RepositoryError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_current_price_prefers_discount() {
        let item = CatalogItem::new(
            ProductId::new(1),
            "Mug",
            "12.00".parse().unwrap(),
            Some("9.50".parse().unwrap()),
            CurrencyCode::USD,
        );
        assert_eq!(item.current_price().amount, "9.50".parse().unwrap());
    }

    #[test]
    fn test_current_price_falls_back_to_list_price() {
        let item = CatalogItem::new(
            ProductId::new(1),
            "Mug",
            "12.00".parse().unwrap(),
            None,
            CurrencyCode::USD,
        );
        assert_eq!(item.current_price(), item.price);
    }
}
