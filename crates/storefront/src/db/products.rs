//! Catalog items stored in `storefront.product`.
//!
//! [`ProductRepository`] is the operator-facing write side used by the CLI.
//! [`PgCatalog`] is the read side the cart engine prices against.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use bazaar_core::{CurrencyCode, ProductId};

use super::RepositoryError;
use crate::cart::{CatalogItem, CatalogLookup};

/// A catalog row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    fn into_catalog_item(self, currency: CurrencyCode) -> CatalogItem {
        CatalogItem::new(self.id, self.name, self.price, self.discount_price, currency)
    }
}

/// Input for creating a catalog item, as read from an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
}

impl NewProduct {
    /// Check that the name is present and both prices are non-negative.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name must not be empty".to_owned());
        }
        validate_prices(self.price, self.discount_price)
    }
}

/// Check that a list price and optional discount price are non-negative.
///
/// # Errors
///
/// Returns a description of the offending price.
pub fn validate_prices(price: Decimal, discount_price: Option<Decimal>) -> Result<(), String> {
    if price.is_sign_negative() {
        return Err(format!("price must not be negative: {price}"));
    }
    if let Some(discount) = discount_price
        && discount.is_sign_negative()
    {
        return Err(format!("discount price must not be negative: {discount}"));
    }
    Ok(())
}

/// Repository for catalog writes.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a catalog item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the input fails validation.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        product.validate().map_err(RepositoryError::DataCorruption)?;

        let row = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO storefront.product (name, price, discount_price)
            VALUES ($1, $2, $3)
            RETURNING id, name, price, discount_price, created_at, updated_at
            ",
        )
        .bind(product.name.trim())
        .bind(product.price)
        .bind(product.discount_price)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a catalog item by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, price, discount_price, created_at, updated_at
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Change a live price. `discount_price = None` clears any discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::DataCorruption` if a price is negative.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn reprice(
        &self,
        id: ProductId,
        price: Decimal,
        discount_price: Option<Decimal>,
    ) -> Result<Product, RepositoryError> {
        validate_prices(price, discount_price).map_err(RepositoryError::DataCorruption)?;

        sqlx::query_as::<_, Product>(
            r"
            UPDATE storefront.product
            SET price = $2, discount_price = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, price, discount_price, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(price)
        .bind(discount_price)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

/// Catalog lookup over `storefront.product`, priced in the store currency.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
    currency: CurrencyCode,
}

impl PgCatalog {
    /// Create a catalog over `pool` reporting prices in `currency`.
    #[must_use]
    pub const fn new(pool: PgPool, currency: CurrencyCode) -> Self {
        Self { pool, currency }
    }
}

#[async_trait]
impl CatalogLookup for PgCatalog {
    async fn get(&self, id: ProductId) -> Result<Option<CatalogItem>, RepositoryError> {
        let product = ProductRepository::new(&self.pool).get_by_id(id).await?;
        Ok(product.map(|p| p.into_catalog_item(self.currency)))
    }

    async fn get_many(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CatalogItem>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw_ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, price, discount_price, created_at, updated_at
            FROM storefront.product
            WHERE id = ANY($1)
            ",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|p| (p.id, p.into_catalog_item(self.currency)))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(name: &str, price: i64, discount: Option<i64>) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            price: Decimal::new(price, 2),
            discount_price: discount.map(|d| Decimal::new(d, 2)),
        }
    }

    #[test]
    fn test_validate_accepts_free_items() {
        assert!(product("Sticker", 0, None).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_prices() {
        assert!(product("Mug", -1, None).validate().is_err());
        assert!(product("Mug", 100, Some(-5)).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        assert!(product("   ", 100, None).validate().is_err());
    }

    #[test]
    fn test_new_product_from_yaml_shape() {
        let parsed: NewProduct =
            serde_json::from_str(r#"{"name":"Tea","price":"4.50"}"#).unwrap();
        assert_eq!(parsed.name, "Tea");
        assert_eq!(parsed.price, Decimal::new(450, 2));
        assert!(parsed.discount_price.is_none());
    }
}
