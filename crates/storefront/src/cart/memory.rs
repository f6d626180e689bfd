//! In-memory cart store and catalog.
//!
//! Used by tests and local tooling. The store keeps the same atomicity
//! contract as the Postgres adapter: a mutation runs against a copy of the
//! cart under the store lock and is committed only if it succeeds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use bazaar_core::{CartId, ProductId, UserId};

use super::catalog::{CatalogItem, CatalogLookup};
use super::error::CartError;
use super::model::Cart;
use super::store::{CartMutation, CartStore, IfAbsent};
use crate::db::RepositoryError;

/// Cart store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: Mutex<HashMap<UserId, Cart>>,
    next_id: AtomicI32,
    writes: AtomicUsize,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of carts held.
    pub async fn cart_count(&self) -> usize {
        self.carts.lock().await.len()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn load_by_owner(&self, owner: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.lock().await.get(&owner).cloned())
    }

    async fn modify(
        &self,
        owner: UserId,
        if_absent: IfAbsent,
        mutation: CartMutation,
    ) -> Result<Cart, CartError> {
        let mut carts = self.carts.lock().await;

        let mut cart = match (carts.get(&owner), if_absent) {
            (Some(existing), _) => existing.clone(),
            (None, IfAbsent::Create) => {
                let id = CartId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                Cart::empty(id, owner, Utc::now())
            }
            (None, IfAbsent::Fail) => return Err(CartError::CartNotFound),
        };

        mutation(&mut cart)?;

        cart.updated_at = Utc::now();
        carts.insert(owner, cart.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        drop(carts);

        Ok(cart)
    }
}

/// Catalog backed by a map, with helpers to change it at runtime.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: RwLock<HashMap<ProductId, CatalogItem>>,
}

impl MemoryCatalog {
    /// Create a catalog holding `items`.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|item| (item.id, item)).collect()),
        }
    }

    /// Insert or replace an item.
    pub async fn upsert(&self, item: CatalogItem) {
        self.items.write().await.insert(item.id, item);
    }

    /// Delete an item, returning it if it existed.
    pub async fn remove(&self, id: ProductId) -> Option<CatalogItem> {
        self.items.write().await.remove(&id)
    }
}

#[async_trait]
impl CatalogLookup for MemoryCatalog {
    async fn get(&self, id: ProductId) -> Result<Option<CatalogItem>, RepositoryError> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn get_many(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, CatalogItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| items.get(id).map(|item| (*id, item.clone())))
            .collect())
    }
}
