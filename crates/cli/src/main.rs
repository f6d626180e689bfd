//! Bazaar CLI - Database migrations and catalog management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! bz-cli migrate storefront
//!
//! # Import catalog items
//! bz-cli catalog import -f products.yaml
//!
//! # Change a live price
//! bz-cli catalog reprice --id 3 --price 12.00 --clear-discount
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `catalog import` - Load catalog items from YAML
//! - `catalog reprice` - Change the price of a catalog item

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use bazaar_core::ProductId;

mod commands;

use commands::catalog::DiscountChange;

#[derive(Parser)]
#[command(name = "bz-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Manage the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Import products from a YAML file
    Import {
        /// Path to the YAML file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Change the price of a product
    Reprice {
        /// Product ID
        #[arg(long)]
        id: i32,

        /// New list price
        #[arg(long)]
        price: Decimal,

        /// New discount price
        #[arg(long, conflicts_with = "clear_discount")]
        discount_price: Option<Decimal>,

        /// Remove any discount price
        #[arg(long)]
        clear_discount: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::Import { file } => commands::catalog::import(&file).await?,
            CatalogAction::Reprice {
                id,
                price,
                discount_price,
                clear_discount,
            } => {
                let discount = DiscountChange::from_flags(discount_price, clear_discount);
                commands::catalog::reprice(ProductId::new(id), price, discount).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_discount_flags_conflict() {
        let result = Cli::try_parse_from([
            "bz-cli",
            "catalog",
            "reprice",
            "--id",
            "1",
            "--price",
            "2.00",
            "--discount-price",
            "1.00",
            "--clear-discount",
        ]);
        assert!(result.is_err());
    }
}
