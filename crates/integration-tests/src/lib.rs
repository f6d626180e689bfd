//! Integration tests for Bazaar.
//!
//! Everything runs in-process over the in-memory cart store, catalog, and
//! user store, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_engine` - Cart engine behavior through `CartService`
//! - `cart_api` - Storefront HTTP API through the full router
//! - `accounts` - Profile, password, and address management
//! - `session_outage` - Behavior while the session store is down

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionStore};

use bazaar_core::{CurrencyCode, ProductId};
use bazaar_storefront::app;
use bazaar_storefront::cart::{CartService, CatalogItem, MemoryCartStore, MemoryCatalog};
use bazaar_storefront::config::{CartConfig, StorefrontConfig};
use bazaar_storefront::services::auth::MemoryUserStore;
use bazaar_storefront::state::AppState;

/// Per-line ceiling used throughout the tests.
pub const TEST_MAX_LINE_QUANTITY: i32 = 10;

/// Password every test account signs up with.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Catalog item priced in USD.
#[must_use]
pub fn item(id: i32, name: &str, cents: i64, discount_cents: Option<i64>) -> CatalogItem {
    CatalogItem::new(
        ProductId::new(id),
        name,
        Decimal::new(cents, 2),
        discount_cents.map(|cents| Decimal::new(cents, 2)),
        CurrencyCode::USD,
    )
}

/// Catalog shared by the tests: a mug, a discounted tea, and a poster.
#[must_use]
pub fn sample_catalog() -> MemoryCatalog {
    MemoryCatalog::with_items([
        item(1, "Ceramic Mug", 1400, None),
        item(2, "Tea Sampler", 2250, Some(1800)),
        item(3, "Poster", 999, None),
    ])
}

/// Configuration for in-process tests. Rate limiting is off because
/// in-process requests carry no client address.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        cors_origin: None,
        rate_limit: false,
        cart: CartConfig {
            currency: CurrencyCode::USD,
            max_line_quantity: TEST_MAX_LINE_QUANTITY,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Cart engine over in-memory backends, with handles to both.
pub struct TestEngine {
    pub service: CartService,
    pub store: Arc<MemoryCartStore>,
    pub catalog: Arc<MemoryCatalog>,
}

impl TestEngine {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryCartStore::new());
        let catalog = Arc::new(sample_catalog());
        let service = CartService::new(
            store.clone(),
            catalog.clone(),
            CurrencyCode::USD,
            TEST_MAX_LINE_QUANTITY,
        );

        Self {
            service,
            store,
            catalog,
        }
    }
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// The storefront router over in-memory backends.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryCartStore>,
    pub catalog: Arc<MemoryCatalog>,
    pub users: Arc<MemoryUserStore>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_sessions(MemoryStore::default())
    }

    /// Same as [`TestApp::new`], with sessions kept in `sessions`.
    #[must_use]
    pub fn with_sessions<S>(sessions: S) -> Self
    where
        S: SessionStore + Clone,
    {
        let store = Arc::new(MemoryCartStore::new());
        let catalog = Arc::new(sample_catalog());
        let users = Arc::new(MemoryUserStore::new());

        let state = AppState::with_backends(
            test_config(),
            None,
            store.clone(),
            catalog.clone(),
            users.clone(),
        );

        Self {
            router: app(state, sessions),
            store,
            catalog,
            users,
        }
    }

    /// Send a request, optionally with a JSON body and a session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the request can't be built or the router fails.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("valid request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Send a request and decode the JSON response.
    ///
    /// # Panics
    ///
    /// Panics if the response body isn't JSON.
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.send(method, uri, body, cookie).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    /// Sign up and log in, returning the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if signup or login fails.
    pub async fn login_as(&self, email: &str) -> String {
        let (status, _) = self
            .send_json(
                "POST",
                "/user/signup",
                Some(serde_json::json!({
                    "name": "Test Shopper",
                    "email": email,
                    "password": TEST_PASSWORD,
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let response = self
            .send(
                "POST",
                "/user/login",
                Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        session_cookie(&response).expect("login sets a session cookie")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// The `name=value` part of the response's `Set-Cookie` header.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(str::to_owned)
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body can't be read or isn't JSON.
pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
