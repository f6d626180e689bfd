//! Postgres cart store.
//!
//! Every mutation is one transaction holding a row lock on the owner's cart,
//! so concurrent writers to the same cart serialize in the database, across
//! any number of service instances.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use bazaar_core::{CartId, ProductId, UserId};

use super::RepositoryError;
use crate::cart::{Cart, CartError, CartLineItem, CartMutation, CartStore, IfAbsent};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LineRow {
    product_id: ProductId,
    quantity: i32,
}

impl CartRow {
    fn into_cart(self, lines: Vec<LineRow>) -> Cart {
        Cart {
            id: self.id,
            owner_id: self.user_id,
            items: lines
                .into_iter()
                .map(|line| CartLineItem {
                    item_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Cart store backed by `storefront.cart` and `storefront.cart_item`.
#[derive(Debug, Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(
        tx: &mut Transaction<'_, Postgres>,
        cart_id: CartId,
    ) -> Result<Vec<LineRow>, sqlx::Error> {
        sqlx::query_as::<_, LineRow>(
            r"
            SELECT product_id, quantity
            FROM storefront.cart_item
            WHERE cart_id = $1
            ORDER BY position ASC
            ",
        )
        .bind(cart_id)
        .fetch_all(&mut **tx)
        .await
    }

    async fn write_lines(
        tx: &mut Transaction<'_, Postgres>,
        cart: &Cart,
    ) -> Result<DateTime<Utc>, sqlx::Error> {
        sqlx::query("DELETE FROM storefront.cart_item WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut **tx)
            .await?;

        if !cart.items.is_empty() {
            let product_ids: Vec<i32> = cart.items.iter().map(|l| l.item_id.as_i32()).collect();
            let quantities: Vec<i32> = cart.items.iter().map(|l| l.quantity).collect();
            let positions: Vec<i32> = (0..).take(cart.items.len()).collect();

            sqlx::query(
                r"
                INSERT INTO storefront.cart_item (cart_id, product_id, quantity, position)
                SELECT $1, product_id, quantity, position
                FROM UNNEST($2::int4[], $3::int4[], $4::int4[])
                    AS line(product_id, quantity, position)
                ",
            )
            .bind(cart.id)
            .bind(&product_ids)
            .bind(&quantities)
            .bind(&positions)
            .execute(&mut **tx)
            .await?;
        }

        let (updated_at,): (DateTime<Utc>,) = sqlx::query_as(
            r"
            UPDATE storefront.cart
            SET updated_at = NOW()
            WHERE id = $1
            RETURNING updated_at
            ",
        )
        .bind(cart.id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(updated_at)
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn load_by_owner(&self, owner: UserId) -> Result<Option<Cart>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, created_at, updated_at
            FROM storefront.cart
            WHERE user_id = $1
            ",
        )
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = Self::load_lines(&mut tx, row.id).await?;
        tx.commit().await?;

        Ok(Some(row.into_cart(lines)))
    }

    async fn modify(
        &self,
        owner: UserId,
        if_absent: IfAbsent,
        mutation: CartMutation,
    ) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;

        if if_absent == IfAbsent::Create {
            sqlx::query(
                r"
                INSERT INTO storefront.cart (user_id)
                VALUES ($1)
                ON CONFLICT (user_id) DO NOTHING
                ",
            )
            .bind(owner)
            .execute(&mut *tx)
            .await?;
        }

        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, created_at, updated_at
            FROM storefront.cart
            WHERE user_id = $1
            FOR UPDATE
            ",
        )
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CartError::CartNotFound)?;

        let lines = Self::load_lines(&mut tx, row.id).await?;
        let mut cart = row.into_cart(lines);

        // Dropping `tx` on the error path rolls back, including a cart row
        // inserted above.
        mutation(&mut cart)?;

        cart.updated_at = Self::write_lines(&mut tx, &cart).await?;
        tx.commit().await?;

        tracing::debug!(cart_id = %cart.id, lines = cart.items.len(), "Cart persisted");
        Ok(cart)
    }
}
