//! Storefront HTTP API through the full router over in-memory backends.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use bazaar_core::{ProductId, UserId};
use bazaar_integration_tests::{TEST_PASSWORD, TestApp, read_json, session_cookie};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let response = app.send("GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send("GET", "/health/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();

    let response = app.send("GET", "/health", None, None).await;
    assert!(response.headers().contains_key("x-request-id"));
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_signup_login_me_logout() {
    let app = TestApp::new();
    let cookie = app.login_as("Shopper@Example.com").await;

    let (status, body) = app.send_json("GET", "/user/me", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "shopper@example.com");

    let (status, body) = app.send_json("POST", "/user/logout", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = app.send_json("GET", "/user/me", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_for_deleted_user() {
    let app = TestApp::new();
    let cookie = app.login_as("gone@example.com").await;

    let (_, body) = app.send_json("GET", "/user/me", None, Some(&cookie)).await;
    let id = i32::try_from(body["user"]["id"].as_i64().unwrap()).unwrap();
    assert!(app.users.remove(UserId::new(id)).await);

    let (status, body) = app.send_json("GET", "/user/me", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_duplicate_signup_rejected() {
    let app = TestApp::new();
    app.login_as("dup@example.com").await;

    let (status, body) = app
        .send_json(
            "POST",
            "/user/signup",
            Some(json!({ "name": "Again", "email": "dup@example.com", "password": TEST_PASSWORD })),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let app = TestApp::new();
    app.login_as("shopper@example.com").await;

    let response = app
        .send(
            "POST",
            "/user/login",
            Some(json!({ "email": "shopper@example.com", "password": "not-the-password" })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    let body = read_json(response).await;
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_short_password_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(
            "POST",
            "/user/signup",
            Some(json!({ "name": "Shopper", "email": "a@example.com", "password": "short" })),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_cart_requires_login() {
    let app = TestApp::new();

    let (status, body) = app.send_json("GET", "/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Please login to continue");

    let (status, _) = app
        .send_json("POST", "/cart/add", Some(json!({ "itemId": 1, "quantity": 1 })), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.cart_count().await, 0);
}

#[tokio::test]
async fn test_empty_cart_is_not_an_error() {
    let app = TestApp::new();
    let cookie = app.login_as("shopper@example.com").await;

    let (status, body) = app.send_json("GET", "/cart", None, Some(&cookie)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Your cart is empty.");
    assert_eq!(body["totalAmount"], "0.00");
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["cart"]["items"], json!([]));
}

#[tokio::test]
async fn test_cart_flow() {
    let app = TestApp::new();
    let cookie = app.login_as("shopper@example.com").await;

    let (status, body) = app
        .send_json(
            "POST",
            "/cart/add",
            Some(json!({ "itemId": 1, "quantity": 2 })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product added to cart successfully.");
    assert_eq!(body["cart"]["items"], json!([{ "itemId": 1, "quantity": 2 }]));

    let (status, _) = app
        .send_json(
            "POST",
            "/cart/add",
            Some(json!({ "productId": 2, "quantity": 1 })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send_json(
            "PUT",
            "/cart/update",
            Some(json!({ "itemId": 1, "quantity": 3 })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart updated successfully.");

    let (status, body) = app.send_json("GET", "/cart", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalAmount"], "60.00");
    assert_eq!(body["partial"], false);
    assert_eq!(body["cart"]["itemCount"], 2);
    assert_eq!(body["cart"]["totalQuantity"], 4);
    assert_eq!(body["cart"]["items"][0]["unitPrice"], "14.00");
    assert_eq!(body["cart"]["items"][0]["lineTotal"], "42.00");
    assert_eq!(body["cart"]["items"][1]["unitPrice"], "18.00");

    let (status, body) = app
        .send_json("DELETE", "/cart/delete", Some(json!({ "itemId": 2 })), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product removed from cart successfully.");

    let (_, body) = app.send_json("GET", "/cart", None, Some(&cookie)).await;
    assert_eq!(body["totalAmount"], "42.00");
}

#[tokio::test]
async fn test_cart_validation_errors() {
    let app = TestApp::new();
    let cookie = app.login_as("shopper@example.com").await;

    let cases = [
        (json!({ "itemId": 1, "quantity": 0 }), StatusCode::BAD_REQUEST),
        (json!({ "itemId": 1, "quantity": -2 }), StatusCode::BAD_REQUEST),
        (json!({ "itemId": 1, "quantity": 11 }), StatusCode::BAD_REQUEST),
        (json!({ "itemId": 1, "quantity": 1.5 }), StatusCode::BAD_REQUEST),
        (json!({ "itemId": 1 }), StatusCode::BAD_REQUEST),
        (json!({ "itemId": 404, "quantity": 1 }), StatusCode::NOT_FOUND),
    ];

    for (body, expected) in cases {
        let (status, response) = app
            .send_json("POST", "/cart/add", Some(body.clone()), Some(&cookie))
            .await;
        assert_eq!(status, expected, "body: {body}");
        assert_eq!(response["success"], false, "body: {body}");
    }

    assert_eq!(app.store.cart_count().await, 0);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = TestApp::new();
    let cookie = app.login_as("shopper@example.com").await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/cart/add")
        .header("content-type", "application/json")
        .header("cookie", &cookie)
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_update_and_delete_not_found() {
    let app = TestApp::new();
    let cookie = app.login_as("shopper@example.com").await;

    let (status, body) = app
        .send_json(
            "PUT",
            "/cart/update",
            Some(json!({ "itemId": 1, "quantity": 1 })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cart not found");

    app.send_json(
        "POST",
        "/cart/add",
        Some(json!({ "itemId": 1, "quantity": 1 })),
        Some(&cookie),
    )
    .await;

    let (status, body) = app
        .send_json("DELETE", "/cart/delete", Some(json!({ "itemId": 3 })), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found in cart");

    let (status, body) = app
        .send_json("DELETE", "/cart/delete", Some(json!({ "itemId": 404 })), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let writes = app.store.write_count();
    let (status, body) = app
        .send_json(
            "PUT",
            "/cart/update",
            Some(json!({ "itemId": 404, "quantity": 2 })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
    assert_eq!(app.store.write_count(), writes);
}

#[tokio::test]
async fn test_update_to_zero_empties_cart() {
    let app = TestApp::new();
    let cookie = app.login_as("shopper@example.com").await;

    app.send_json(
        "POST",
        "/cart/add",
        Some(json!({ "itemId": 3, "quantity": 2 })),
        Some(&cookie),
    )
    .await;
    let (status, body) = app
        .send_json(
            "PUT",
            "/cart/update",
            Some(json!({ "itemId": 3, "quantity": 0 })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["items"], json!([]));

    let (_, body) = app.send_json("GET", "/cart", None, Some(&cookie)).await;
    assert_eq!(body["message"], "Your cart is empty.");
}

#[tokio::test]
async fn test_removed_catalog_item_flagged() {
    let app = TestApp::new();
    let cookie = app.login_as("shopper@example.com").await;

    for item_id in [1, 3] {
        app.send_json(
            "POST",
            "/cart/add",
            Some(json!({ "itemId": item_id, "quantity": 1 })),
            Some(&cookie),
        )
        .await;
    }
    app.catalog.remove(ProductId::new(3)).await;

    let (status, body) = app.send_json("GET", "/cart", None, Some(&cookie)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["partial"], true);
    assert_eq!(body["unavailableItems"], json!([3]));
    assert_eq!(body["totalAmount"], "14.00");
    assert_eq!(body["cart"]["items"][1]["available"], false);
}

#[tokio::test]
async fn test_carts_follow_the_session() {
    let app = TestApp::new();
    let alice = app.login_as("alice@example.com").await;
    let bob = app.login_as("bob@example.com").await;

    app.send_json(
        "POST",
        "/cart/add",
        Some(json!({ "itemId": 2, "quantity": 2 })),
        Some(&alice),
    )
    .await;

    let (_, body) = app.send_json("GET", "/cart", None, Some(&bob)).await;
    assert_eq!(body["message"], "Your cart is empty.");

    let (_, body) = app.send_json("GET", "/cart", None, Some(&alice)).await;
    assert_eq!(body["totalAmount"], "36.00");
}
