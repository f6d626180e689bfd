//! Cart consistency engine.
//!
//! Maintains a single authoritative cart per owner, merges repeated additions
//! of the same item, and prices carts against the live catalog at read time.
//!
//! # Structure
//!
//! - [`model`] - the `Cart` aggregate and its invariant-keeping mutations
//! - [`store`] - the `CartStore` seam with its atomic `modify` primitive
//! - [`catalog`] - the `CatalogLookup` seam
//! - [`snapshot`] - read-time pricing and totals
//! - [`service`] - `CartService`, the engine operations
//! - [`memory`] - in-memory store and catalog
//!
//! Postgres adapters live in [`crate::db::carts`] and [`crate::db::products`].

pub mod catalog;
pub mod error;
pub mod memory;
pub mod model;
pub mod service;
pub mod snapshot;
pub mod store;

pub use catalog::{CatalogItem, CatalogLookup};
pub use error::{CartError, ErrorKind};
pub use memory::{MemoryCartStore, MemoryCatalog};
pub use model::{Cart, CartLineItem};
pub use service::{CartService, DEFAULT_MAX_LINE_QUANTITY};
pub use snapshot::{CartSnapshot, SnapshotLine};
pub use store::{CartMutation, CartStore, IfAbsent};
