//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cart::{CartService, CartStore, CatalogLookup};
use crate::config::StorefrontConfig;
use crate::db::{PgCartStore, PgCatalog};
use crate::services::auth::{AuthService, PgUserStore, UserStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the cart engine and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    cart: CartService,
    auth: AuthService,
}

impl AppState {
    /// Create the production state, backed by `PostgreSQL`.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let store: Arc<dyn CartStore> = Arc::new(PgCartStore::new(pool.clone()));
        let catalog: Arc<dyn CatalogLookup> =
            Arc::new(PgCatalog::new(pool.clone(), config.cart.currency));
        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));

        Self::with_backends(config, Some(pool), store, catalog, users)
    }

    /// Create state over arbitrary backends.
    ///
    /// `pool` is only used by the readiness check; pass `None` when the
    /// backends are not database-backed.
    #[must_use]
    pub fn with_backends(
        config: StorefrontConfig,
        pool: Option<PgPool>,
        store: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogLookup>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let cart = CartService::new(
            store,
            catalog,
            config.cart.currency,
            config.cart.max_line_quantity,
        );
        let auth = AuthService::new(users);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cart,
                auth,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database connection pool, when the state has one.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the cart engine.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// Get the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}
