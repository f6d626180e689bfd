//! Bazaar Storefront library.
//!
//! Hosts the cart consistency engine and the HTTP service around it. The
//! binary in `main.rs` wires the Postgres adapters; tests build the same
//! router over in-memory adapters through [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware::from_fn,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::state::AppState;

/// Build the storefront router over `state`, with sessions kept in `sessions`.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app<S>(state: AppState, sessions: S) -> Router
where
    S: SessionStore + Clone,
{
    let config = state.config();
    let session_layer = middleware::create_session_layer(sessions, config);

    let router = routes::routes(config).layer(session_layer);
    let router = match config.cors_origin.as_deref().map(cors_layer) {
        Some(Ok(cors)) => router.layer(cors),
        Some(Err(origin)) => {
            tracing::warn!(%origin, "Ignoring invalid CORS origin");
            router
        }
        None => router,
    };

    router
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

fn cors_layer(origin: &str) -> Result<CorsLayer, String> {
    let origin = HeaderValue::from_str(origin).map_err(|_| origin.to_owned())?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::StatusCode};
    use secrecy::SecretString;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::cart::{MemoryCartStore, MemoryCatalog};
    use crate::config::{CartConfig, StorefrontConfig};
    use crate::services::auth::MemoryUserStore;

    fn test_app(cors_origin: Option<&str>) -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/unused"),
            host: [127, 0, 0, 1].into(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            cors_origin: cors_origin.map(str::to_owned),
            rate_limit: false,
            cart: CartConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::with_backends(
            config,
            None,
            Arc::new(MemoryCartStore::new()),
            Arc::new(MemoryCatalog::default()),
            Arc::new(MemoryUserStore::new()),
        );
        app(state, MemoryStore::default())
    }

    #[tokio::test]
    async fn test_upstream_request_id_echoed() {
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "edge-42")
            .body(Body::empty())
            .unwrap();

        let response = test_app(None).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "edge-42");
    }

    #[tokio::test]
    async fn test_cors_preflight_for_configured_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/cart/add")
            .header(header::ORIGIN, "https://shop.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = test_app(Some("https://shop.example.com"))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://shop.example.com"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let request = Request::builder()
            .uri("/checkout")
            .body(Body::empty())
            .unwrap();

        let response = test_app(None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
