//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                            - Liveness check
//! GET    /health/ready                      - Readiness check (database ping)
//!
//! # Accounts
//! POST   /user/signup                       - Create an account
//! POST   /user/login                        - Log in (sets the session identity)
//! POST   /user/logout                       - Log out
//! GET    /user/me                           - Current account (requires auth)
//! PUT    /user/update-user-info             - Update name, email, phone (requires auth)
//! PUT    /user/update-user-password         - Change password (requires auth)
//! GET    /user/addresses                    - Saved addresses (requires auth)
//! PUT    /user/update-user-addresses        - Add or replace an address (requires auth)
//! DELETE /user/delete-user-address/{id}     - Delete an address (requires auth)
//! GET    /user/user-info/{id}               - Public profile
//!
//! # Cart (requires auth)
//! GET    /cart                              - Cart priced against the live catalog
//! POST   /cart/add                          - Add an item, merging with an existing line
//! PUT    /cart/update                       - Set a line's quantity (0 removes it)
//! DELETE /cart/delete                       - Remove a line
//! ```

pub mod cart;
pub mod health;
pub mod user;

use axum::{
    Router,
    extract::FromRequest,
    routing::{delete, get, post, put},
};

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// JSON body extractor whose rejections render as [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Create the account routes router.
pub fn user_routes(config: &StorefrontConfig) -> Router<AppState> {
    let credentials = Router::new()
        .route("/signup", post(user::signup))
        .route("/login", post(user::login));

    let credentials = if config.rate_limit {
        credentials.layer(auth_rate_limiter())
    } else {
        credentials
    };

    Router::new()
        .merge(credentials)
        .route("/logout", post(user::logout))
        .route("/me", get(user::me))
        .route("/update-user-info", put(user::update_info))
        .route("/update-user-password", put(user::update_password))
        .route("/addresses", get(user::addresses))
        .route("/update-user-addresses", put(user::update_addresses))
        .route("/delete-user-address/{id}", delete(user::delete_address))
        .route("/user-info/{id}", get(user::user_info))
}

/// Create the cart mutation routes router, nested under `/cart`.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/update", put(cart::update))
        .route("/delete", delete(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/user", user_routes(config))
        .route("/cart", get(cart::show))
        .nest("/cart", cart_routes())
}
