//! Cart engine behavior through `CartService` over in-memory backends.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use bazaar_core::{ProductId, UserId};
use bazaar_integration_tests::{TEST_MAX_LINE_QUANTITY, TestEngine, item};
use bazaar_storefront::cart::{CartError, ErrorKind};

const SHOPPER: UserId = UserId::new(7);
const MUG: ProductId = ProductId::new(1);
const TEA: ProductId = ProductId::new(2);
const POSTER: ProductId = ProductId::new(3);
const UNKNOWN: ProductId = ProductId::new(404);

fn quantity_of(cart: &bazaar_storefront::cart::Cart, item_id: ProductId) -> Option<i32> {
    cart.line(item_id).map(|line| line.quantity)
}

// =============================================================================
// Shopping Session
// =============================================================================

#[tokio::test]
async fn test_full_shopping_session() {
    let engine = TestEngine::new();
    let cart = &engine.service;

    cart.add(SHOPPER, MUG, 2).await.unwrap();
    cart.add(SHOPPER, TEA, 1).await.unwrap();
    let updated = cart.update_quantity(SHOPPER, MUG, 3).await.unwrap();
    assert_eq!(quantity_of(&updated, MUG), Some(3));

    let snapshot = cart.snapshot(SHOPPER).await.unwrap();
    // 3 x 14.00 + 1 x 18.00 (discounted)
    assert_eq!(snapshot.total_amount.amount, Decimal::new(6000, 2));
    assert_eq!(snapshot.total_quantity(), 4);
    assert!(!snapshot.is_partial());

    let after_remove = cart.remove(SHOPPER, TEA).await.unwrap();
    assert_eq!(after_remove.items.len(), 1);

    let snapshot = cart.snapshot(SHOPPER).await.unwrap();
    assert_eq!(snapshot.total_amount.amount, Decimal::new(4200, 2));
}

#[tokio::test]
async fn test_repeated_add_merges_into_one_line() {
    let engine = TestEngine::new();

    engine.service.add(SHOPPER, POSTER, 1).await.unwrap();
    let cart = engine.service.add(SHOPPER, POSTER, 4).await.unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(quantity_of(&cart, POSTER), Some(5));
    assert_eq!(engine.store.cart_count().await, 1);
}

#[tokio::test]
async fn test_lines_keep_insertion_order() {
    let engine = TestEngine::new();

    engine.service.add(SHOPPER, POSTER, 1).await.unwrap();
    engine.service.add(SHOPPER, MUG, 1).await.unwrap();
    engine.service.add(SHOPPER, POSTER, 1).await.unwrap();

    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();
    let order: Vec<ProductId> = snapshot.lines.iter().map(|line| line.item_id).collect();
    assert_eq!(order, vec![POSTER, MUG]);
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let engine = TestEngine::new();
    engine.service.add(SHOPPER, MUG, 2).await.unwrap();

    let cart = engine.service.update_quantity(SHOPPER, MUG, 0).await.unwrap();

    assert!(cart.is_empty());
    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.cart_id, Some(cart.id));
}

#[tokio::test]
async fn test_carts_are_isolated_per_owner() {
    let engine = TestEngine::new();
    let other = UserId::new(8);

    engine.service.add(SHOPPER, MUG, 1).await.unwrap();
    engine.service.add(other, TEA, 2).await.unwrap();

    let mine = engine.service.snapshot(SHOPPER).await.unwrap();
    let theirs = engine.service.snapshot(other).await.unwrap();
    assert_eq!(mine.lines.len(), 1);
    assert_eq!(mine.lines[0].item_id, MUG);
    assert_eq!(theirs.lines[0].item_id, TEA);
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn test_rejections_leave_cart_untouched() {
    let engine = TestEngine::new();
    engine.service.add(SHOPPER, MUG, 2).await.unwrap();
    let writes = engine.store.write_count();

    let invalid = engine.service.add(SHOPPER, MUG, 0).await.unwrap_err();
    assert!(matches!(invalid, CartError::InvalidQuantity(0)));

    let negative = engine.service.update_quantity(SHOPPER, MUG, -1).await.unwrap_err();
    assert_eq!(negative.kind(), ErrorKind::Validation);

    let unknown = engine.service.add(SHOPPER, UNKNOWN, 1).await.unwrap_err();
    assert!(matches!(unknown, CartError::ItemNotFound(id) if id == UNKNOWN));

    let unknown_update = engine
        .service
        .update_quantity(SHOPPER, UNKNOWN, 1)
        .await
        .unwrap_err();
    assert!(matches!(unknown_update, CartError::ItemNotFound(id) if id == UNKNOWN));

    let unknown_remove = engine.service.remove(SHOPPER, UNKNOWN).await.unwrap_err();
    assert!(matches!(unknown_remove, CartError::ItemNotFound(id) if id == UNKNOWN));
    assert_eq!(unknown_remove.kind(), ErrorKind::NotFound);

    let not_in_cart = engine.service.remove(SHOPPER, TEA).await.unwrap_err();
    assert!(matches!(not_in_cart, CartError::LineNotFound(id) if id == TEA));

    assert_eq!(engine.store.write_count(), writes);
    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();
    assert_eq!(snapshot.total_quantity(), 2);
}

#[tokio::test]
async fn test_update_and_remove_without_cart() {
    let engine = TestEngine::new();

    let update = engine.service.update_quantity(SHOPPER, MUG, 1).await.unwrap_err();
    assert!(matches!(update, CartError::CartNotFound));

    let remove = engine.service.remove(SHOPPER, MUG).await.unwrap_err();
    assert!(matches!(remove, CartError::CartNotFound));

    assert_eq!(engine.store.cart_count().await, 0);
}

#[tokio::test]
async fn test_line_ceiling() {
    let engine = TestEngine::new();
    let max = i64::from(TEST_MAX_LINE_QUANTITY);

    let over = engine.service.add(SHOPPER, MUG, max + 1).await.unwrap_err();
    assert!(matches!(over, CartError::QuantityExceedsLimit { .. }));

    engine.service.add(SHOPPER, MUG, max - 1).await.unwrap();
    let merged_over = engine.service.add(SHOPPER, MUG, 2).await.unwrap_err();
    assert_eq!(merged_over.kind(), ErrorKind::Validation);

    let huge = engine.service.add(SHOPPER, MUG, i64::MAX).await.unwrap_err();
    assert_eq!(huge.kind(), ErrorKind::Validation);

    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();
    assert_eq!(snapshot.total_quantity(), max - 1);
}

// =============================================================================
// Live Pricing
// =============================================================================

#[tokio::test]
async fn test_empty_snapshot_without_cart() {
    let engine = TestEngine::new();

    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();

    assert!(snapshot.is_empty());
    assert_eq!(snapshot.cart_id, None);
    assert_eq!(snapshot.total_amount.amount, Decimal::ZERO);
    assert_eq!(engine.store.cart_count().await, 0);
}

#[tokio::test]
async fn test_reprice_is_reflected_immediately() {
    let engine = TestEngine::new();
    engine.service.add(SHOPPER, MUG, 2).await.unwrap();

    engine.catalog.upsert(item(1, "Ceramic Mug", 1600, Some(1200))).await;

    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();
    assert_eq!(snapshot.lines[0].unit_price.unwrap().amount, Decimal::new(1200, 2));
    assert_eq!(snapshot.total_amount.amount, Decimal::new(2400, 2));
}

#[tokio::test]
async fn test_vanished_item_gives_partial_snapshot() {
    let engine = TestEngine::new();
    engine.service.add(SHOPPER, MUG, 1).await.unwrap();
    engine.service.add(SHOPPER, POSTER, 2).await.unwrap();

    engine.catalog.remove(POSTER).await;

    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();
    assert!(snapshot.is_partial());
    assert_eq!(snapshot.unavailable_items(), vec![POSTER]);
    assert_eq!(snapshot.lines.len(), 2);
    assert_eq!(snapshot.total_amount.amount, Decimal::new(1400, 2));

    // Removal still checks the catalog first.
    let removal = engine.service.remove(SHOPPER, POSTER).await.unwrap_err();
    assert!(matches!(removal, CartError::ItemNotFound(_)));
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_converge() {
    let engine = TestEngine::new();

    let first = tokio::spawn({
        let service = engine.service.clone();
        async move { service.add(SHOPPER, MUG, 1).await }
    });
    let second = tokio::spawn({
        let service = engine.service.clone();
        async move { service.add(SHOPPER, MUG, 1).await }
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();
    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(snapshot.lines[0].quantity, 2);
    assert_eq!(engine.store.cart_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_adds_lose_nothing() {
    let engine = TestEngine::new();

    let handles: Vec<_> = (0..TEST_MAX_LINE_QUANTITY)
        .map(|_| {
            let service = engine.service.clone();
            tokio::spawn(async move { service.add(SHOPPER, POSTER, 1).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = engine.service.snapshot(SHOPPER).await.unwrap();
    assert_eq!(snapshot.total_quantity(), i64::from(TEST_MAX_LINE_QUANTITY));
}
