//! Cart route handlers.
//!
//! Every handler resolves the owner from the session, delegates to the cart
//! engine, and renders the result as JSON.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::{CartId, ProductId, UserId};

use super::AppJson;
use crate::cart::{Cart, CartSnapshot, SnapshotLine};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::state::AppState;

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /cart/add` and `PUT /cart/update`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    #[serde(alias = "productId")]
    pub item_id: ProductId,
    pub quantity: i64,
}

/// Body of `DELETE /cart/delete`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    #[serde(alias = "productId")]
    pub item_id: ProductId,
}

// =============================================================================
// Views
// =============================================================================

/// A persisted cart line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub item_id: ProductId,
    pub quantity: i32,
}

/// A persisted cart, as returned by mutations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub owner_id: UserId,
    pub items: Vec<CartLineView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id,
            owner_id: cart.owner_id,
            items: cart
                .items
                .into_iter()
                .map(|line| CartLineView {
                    item_id: line.item_id,
                    quantity: line.quantity,
                })
                .collect(),
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

/// Response to a successful mutation.
#[derive(Debug, Serialize)]
pub struct CartMutationResponse {
    pub success: bool,
    pub message: &'static str,
    pub cart: CartView,
}

impl CartMutationResponse {
    fn new(message: &'static str, cart: Cart) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            cart: cart.into(),
        })
    }
}

/// A priced line of `GET /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLineView {
    pub item_id: ProductId,
    pub name: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<String>,
    pub line_total: Option<String>,
    pub available: bool,
}

impl From<SnapshotLine> for PricedLineView {
    fn from(line: SnapshotLine) -> Self {
        Self {
            available: line.is_available(),
            item_id: line.item_id,
            name: line.name,
            quantity: line.quantity,
            unit_price: line.unit_price.map(|p| format_amount(p.amount)),
            line_total: line.line_total.map(|p| format_amount(p.amount)),
        }
    }
}

/// Cart contents of `GET /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedCartView {
    pub items: Vec<PricedLineView>,
    pub item_count: usize,
    pub total_quantity: i64,
}

/// Response to `GET /cart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshotResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub cart: PricedCartView,
    pub total_amount: String,
    pub currency: String,
    pub partial: bool,
    pub unavailable_items: Vec<ProductId>,
}

impl From<CartSnapshot> for CartSnapshotResponse {
    fn from(snapshot: CartSnapshot) -> Self {
        let message = snapshot.is_empty().then_some("Your cart is empty.");
        let partial = snapshot.is_partial();
        let unavailable_items = snapshot.unavailable_items();
        let total_quantity = snapshot.total_quantity();
        let total_amount = format_amount(snapshot.total_amount.amount);
        let currency = snapshot.total_amount.currency_code.code().to_owned();
        let items: Vec<PricedLineView> = snapshot.lines.into_iter().map(Into::into).collect();

        Self {
            success: true,
            message,
            cart: PricedCartView {
                item_count: items.len(),
                items,
                total_quantity,
            },
            total_amount,
            currency,
            partial,
            unavailable_items,
        }
    }
}

/// Amounts are always rendered with two decimal places.
fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

// =============================================================================
// Handlers
// =============================================================================

/// Add an item to the caller's cart.
#[instrument(skip(state, user), fields(owner_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    AppJson(body): AppJson<CartItemRequest>,
) -> Result<Json<CartMutationResponse>> {
    let cart = state
        .cart()
        .add(user.id, body.item_id, body.quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("item_id", &body.item_id.to_string())]),
    );

    Ok(CartMutationResponse::new(
        "Product added to cart successfully.",
        cart,
    ))
}

/// Set the quantity of a line in the caller's cart.
#[instrument(skip(state, user), fields(owner_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    AppJson(body): AppJson<CartItemRequest>,
) -> Result<Json<CartMutationResponse>> {
    let cart = state
        .cart()
        .update_quantity(user.id, body.item_id, body.quantity)
        .await?;

    Ok(CartMutationResponse::new("Cart updated successfully.", cart))
}

/// Remove a line from the caller's cart.
#[instrument(skip(state, user), fields(owner_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    AppJson(body): AppJson<RemoveItemRequest>,
) -> Result<Json<CartMutationResponse>> {
    let cart = state.cart().remove(user.id, body.item_id).await?;

    add_breadcrumb(
        "cart",
        "Removed item",
        Some(&[("item_id", &body.item_id.to_string())]),
    );

    Ok(CartMutationResponse::new(
        "Product removed from cart successfully.",
        cart,
    ))
}

/// Show the caller's cart priced against the live catalog.
#[instrument(skip(state, user), fields(owner_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartSnapshotResponse>> {
    let snapshot = state.cart().snapshot(user.id).await?;
    Ok(Json(snapshot.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{CurrencyCode, Price};

    use super::*;

    #[test]
    fn test_request_accepts_product_id_alias() {
        let body: CartItemRequest =
            serde_json::from_str(r#"{"productId": 4, "quantity": 2}"#).unwrap();
        assert_eq!(body.item_id, ProductId::new(4));
        assert_eq!(body.quantity, 2);

        let body: RemoveItemRequest = serde_json::from_str(r#"{"itemId": 9}"#).unwrap();
        assert_eq!(body.item_id, ProductId::new(9));
    }

    #[test]
    fn test_request_rejects_fractional_quantity() {
        assert!(serde_json::from_str::<CartItemRequest>(r#"{"itemId": 1, "quantity": 1.5}"#).is_err());
        assert!(serde_json::from_str::<CartItemRequest>(r#"{"itemId": 1}"#).is_err());
    }

    #[test]
    fn test_empty_snapshot_view() {
        let snapshot = CartSnapshot::empty(UserId::new(1), None, CurrencyCode::EUR);
        let json = serde_json::to_value(CartSnapshotResponse::from(snapshot)).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Your cart is empty.");
        assert_eq!(json["totalAmount"], "0.00");
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["cart"]["itemCount"], 0);
        assert_eq!(json["partial"], false);
    }

    #[test]
    fn test_snapshot_view_flags_unavailable_line() {
        let snapshot = CartSnapshot {
            owner_id: UserId::new(1),
            cart_id: Some(CartId::new(1)),
            lines: vec![
                SnapshotLine {
                    item_id: ProductId::new(1),
                    name: Some("Mug".to_owned()),
                    quantity: 2,
                    unit_price: Some(Price::new(Decimal::new(450, 2), CurrencyCode::USD)),
                    line_total: Some(Price::new(Decimal::new(900, 2), CurrencyCode::USD)),
                },
                SnapshotLine {
                    item_id: ProductId::new(2),
                    name: None,
                    quantity: 1,
                    unit_price: None,
                    line_total: None,
                },
            ],
            total_amount: Price::new(Decimal::new(900, 2), CurrencyCode::USD),
        };

        let json = serde_json::to_value(CartSnapshotResponse::from(snapshot)).unwrap();

        assert!(json.get("message").is_none());
        assert_eq!(json["totalAmount"], "9.00");
        assert_eq!(json["partial"], true);
        assert_eq!(json["unavailableItems"], serde_json::json!([2]));
        assert_eq!(json["cart"]["totalQuantity"], 3);
        assert_eq!(json["cart"]["items"][0]["unitPrice"], "4.50");
        assert_eq!(json["cart"]["items"][1]["available"], false);
        assert!(json["cart"]["items"][1]["lineTotal"].is_null());
    }
}
