//! Domain models for storefront.
//!
//! Cart types live in [`crate::cart`]; this module holds account, address, and
//! session state.

pub mod address;
pub mod session;
pub mod user;

pub use address::{Address, AddressInput};
pub use session::{CurrentUser, keys};
pub use user::{PublicProfile, User};
