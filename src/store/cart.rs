//! Cart persistence: snapshot-priced lines keyed by (customer, product).

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::cart::CartLine;
use crate::error::ApiError;
use crate::store::catalog::Product;

/// A cart line as returned to clients: the frozen snapshot alongside the
/// live catalog price, so the storefront can show drift.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLineView {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price_snapshot: Option<Decimal>,
    pub unit_price: Decimal,
}

pub async fn list_lines(db: &PgPool, customer_id: Uuid) -> Result<Vec<CartLineView>, ApiError> {
    Ok(sqlx::query_as::<_, CartLineView>(
        "SELECT c.product_id, p.name AS product_name, c.quantity, c.price_snapshot, p.sell_price AS unit_price \
         FROM cart_items c JOIN products p ON p.id = c.product_id \
         WHERE c.customer_id = $1 ORDER BY p.name",
    )
    .bind(customer_id)
    .fetch_all(db)
    .await?)
}

/// Adds a product to the cart, snapshotting the current sell price. Adding
/// a product already in the cart accumulates the quantity and refreshes the
/// snapshot.
pub async fn add_line(
    db: &PgPool,
    customer_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<CartLineView, ApiError> {
    let mut tx = db.begin().await?;
    let product = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = $1 AND discontinued_at IS NULL FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("product {product_id} not found")))?;

    if product.stock_on_hand < quantity {
        return Err(ApiError::InvalidState(format!(
            "not enough stock for {}: {} available",
            product.name, product.stock_on_hand
        )));
    }

    let (quantity, price_snapshot): (i32, Option<Decimal>) = sqlx::query_as(
        "INSERT INTO cart_items (customer_id, product_id, quantity, price_snapshot) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (customer_id, product_id) DO UPDATE SET \
             quantity = cart_items.quantity + EXCLUDED.quantity, \
             price_snapshot = EXCLUDED.price_snapshot, \
             updated_at = NOW() \
         RETURNING quantity, price_snapshot",
    )
    .bind(customer_id)
    .bind(product_id)
    .bind(quantity)
    .bind(product.sell_price)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(CartLineView {
        product_id,
        product_name: product.name,
        quantity,
        price_snapshot,
        unit_price: product.sell_price,
    })
}

/// Sets a line's quantity. Zero removes the line; any other value
/// re-validates stock and refreshes the price snapshot.
pub async fn update_quantity(
    db: &PgPool,
    customer_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<Option<CartLineView>, ApiError> {
    if quantity == 0 {
        remove_line(db, customer_id, product_id).await?;
        return Ok(None);
    }

    let mut tx = db.begin().await?;
    let exists: Option<(i32,)> = sqlx::query_as(
        "SELECT quantity FROM cart_items WHERE customer_id = $1 AND product_id = $2 FOR UPDATE",
    )
    .bind(customer_id)
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound(format!("product {product_id} is not in the cart")));
    }

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {product_id} not found")))?;

    if product.stock_on_hand < quantity {
        return Err(ApiError::InvalidState(format!(
            "not enough stock for {}: {} available",
            product.name, product.stock_on_hand
        )));
    }

    sqlx::query(
        "UPDATE cart_items SET quantity = $3, price_snapshot = $4, updated_at = NOW() \
         WHERE customer_id = $1 AND product_id = $2",
    )
    .bind(customer_id)
    .bind(product_id)
    .bind(quantity)
    .bind(product.sell_price)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(Some(CartLineView {
        product_id,
        product_name: product.name,
        quantity,
        price_snapshot: Some(product.sell_price),
        unit_price: product.sell_price,
    }))
}

pub async fn remove_line(db: &PgPool, customer_id: Uuid, product_id: Uuid) -> Result<(), ApiError> {
    let deleted = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1 AND product_id = $2")
        .bind(customer_id)
        .bind(product_id)
        .execute(db)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("product {product_id} is not in the cart")));
    }
    Ok(())
}

pub async fn clear(db: &PgPool, customer_id: Uuid) -> Result<u64, ApiError> {
    let deleted = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1")
        .bind(customer_id)
        .execute(db)
        .await?;
    Ok(deleted.rows_affected())
}

/// Locks and returns the customer's cart lines for the duration of the
/// surrounding transaction. Ordered by product id so concurrent checkouts
/// acquire product locks in the same order.
pub async fn lock_lines(conn: &mut PgConnection, customer_id: Uuid) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as::<_, CartLine>(
        "SELECT * FROM cart_items WHERE customer_id = $1 ORDER BY product_id FOR UPDATE",
    )
    .bind(customer_id)
    .fetch_all(&mut *conn)
    .await
}

/// Deletes exactly the given lines. A line added concurrently while the
/// checkout held the lock is left alone.
pub async fn delete_lines(
    conn: &mut PgConnection,
    customer_id: Uuid,
    product_ids: &[Uuid],
) -> Result<u64, sqlx::Error> {
    let deleted = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1 AND product_id = ANY($2)")
        .bind(customer_id)
        .bind(product_ids)
        .execute(&mut *conn)
        .await?;
    Ok(deleted.rows_affected())
}
