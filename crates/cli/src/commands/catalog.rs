//! Catalog management commands.
//!
//! # Usage
//!
//! ```bash
//! # Import products from a YAML file
//! bz-cli catalog import -f products.yaml
//!
//! # Change a live price (keeps any existing discount)
//! bz-cli catalog reprice --id 3 --price 12.00
//!
//! # Set or clear a discount
//! bz-cli catalog reprice --id 3 --price 12.00 --discount-price 9.50
//! bz-cli catalog reprice --id 3 --price 12.00 --clear-discount
//! ```
//!
//! # Import file format
//!
//! ```yaml
//! - name: Ceramic Mug
//!   price: "14.00"
//! - name: Tea Sampler
//!   price: "22.50"
//!   discount_price: "18.00"
//! ```
//!
//! Repricing takes effect on every cart immediately: carts only store item
//! IDs and quantities, and prices are read from the catalog on each view.

use std::path::Path;

use rust_decimal::Decimal;
use tracing::info;

use bazaar_core::ProductId;
use bazaar_storefront::db::{self, NewProduct, ProductRepository, RepositoryError};

use super::{CommandError, storefront_database_url};

/// How `reprice` treats the discount price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountChange {
    Keep,
    Set(Decimal),
    Clear,
}

impl DiscountChange {
    /// Build from the `--discount-price` / `--clear-discount` flags.
    #[must_use]
    pub const fn from_flags(discount_price: Option<Decimal>, clear_discount: bool) -> Self {
        match (discount_price, clear_discount) {
            (Some(discount), _) => Self::Set(discount),
            (None, true) => Self::Clear,
            (None, false) => Self::Keep,
        }
    }

    const fn apply(self, current: Option<Decimal>) -> Option<Decimal> {
        match self {
            Self::Keep => current,
            Self::Set(discount) => Some(discount),
            Self::Clear => None,
        }
    }
}

/// Parse and validate an import document.
///
/// Every entry is checked before anything is written, so a bad file imports
/// nothing.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or any entry is invalid.
pub fn parse_import(contents: &str) -> Result<Vec<NewProduct>, CommandError> {
    let products: Vec<NewProduct> = serde_yaml::from_str(contents)?;

    let problems: Vec<String> = products
        .iter()
        .enumerate()
        .filter_map(|(index, product)| {
            product
                .validate()
                .err()
                .map(|reason| format!("entry {}: {reason}", index + 1))
        })
        .collect();

    if !problems.is_empty() {
        return Err(CommandError::Invalid(problems.join("; ")));
    }

    Ok(products)
}

/// Import catalog items from a YAML file.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, an entry is
/// invalid, or an insert fails.
pub async fn import(path: &Path) -> Result<(), CommandError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CommandError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let products = parse_import(&contents)?;

    if products.is_empty() {
        info!(path = %path.display(), "No products to import");
        return Ok(());
    }

    let pool = db::create_pool(&storefront_database_url()?).await?;
    let repo = ProductRepository::new(&pool);

    for product in &products {
        let created = repo.create(product).await?;
        info!(
            id = %created.id,
            name = %created.name,
            price = %created.price,
            "Imported product"
        );
    }

    info!(count = products.len(), "Catalog import complete");
    Ok(())
}

/// Change the live price of a catalog item.
///
/// # Errors
///
/// Returns an error if the product doesn't exist, a price is negative, or
/// the update fails.
pub async fn reprice(
    id: ProductId,
    price: Decimal,
    discount: DiscountChange,
) -> Result<(), CommandError> {
    let pool = db::create_pool(&storefront_database_url()?).await?;
    let repo = ProductRepository::new(&pool);

    let current = repo
        .get_by_id(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let updated = repo
        .reprice(id, price, discount.apply(current.discount_price))
        .await?;

    info!(
        id = %updated.id,
        old_price = %current.price,
        new_price = %updated.price,
        discount_price = ?updated.discount_price,
        "Product repriced"
    );
    Ok(())
}
