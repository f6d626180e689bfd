//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Account registration and password login
//!
//! The cart engine is its own top-level module, [`crate::cart`].

pub mod auth;
