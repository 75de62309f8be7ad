//! Product catalog access.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub sell_price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock_on_hand: i32,
    pub reorder_point: i32,
    pub discontinued_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn list_products(db: &PgPool, page: u32, per_page: u32) -> Result<(Vec<Product>, i64), ApiError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE discontinued_at IS NULL ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(per_page as i64)
    .bind(((page - 1) * per_page) as i64)
    .fetch_all(db)
    .await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE discontinued_at IS NULL")
        .fetch_one(db)
        .await?;
    Ok((products, total.0))
}

pub async fn get_product(db: &PgPool, id: Uuid) -> Result<Option<Product>, ApiError> {
    Ok(sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?)
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub sell_price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock_on_hand: i32,
    pub reorder_point: i32,
}

pub async fn insert_product(db: &PgPool, new: &NewProduct) -> Result<Product, ApiError> {
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, category_id, sell_price, cost_price, stock_on_hand, reorder_point) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.category_id)
    .bind(new.sell_price)
    .bind(new.cost_price)
    .bind(new.stock_on_hand)
    .bind(new.reorder_point)
    .fetch_one(db)
    .await?;
    Ok(product)
}

/// Full-row update; the live sell price changes here while existing cart
/// snapshots keep the price their lines were added at.
pub async fn update_product(db: &PgPool, id: Uuid, changes: &NewProduct) -> Result<Product, ApiError> {
    sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, category_id = $4, sell_price = $5, \
         cost_price = $6, stock_on_hand = $7, reorder_point = $8, updated_at = NOW() \
         WHERE id = $1 AND discontinued_at IS NULL RETURNING *",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(changes.category_id)
    .bind(changes.sell_price)
    .bind(changes.cost_price)
    .bind(changes.stock_on_hand)
    .bind(changes.reorder_point)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}

/// Soft delete: mark the product discontinued and record why. The row (and
/// any order lines pointing at it) survive.
pub async fn discontinue_product(
    db: &PgPool,
    id: Uuid,
    reason: &str,
    recorded_by: &str,
) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;
    let updated = sqlx::query("UPDATE products SET discontinued_at = NOW() WHERE id = $1 AND discontinued_at IS NULL")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("product {id} not found")));
    }
    sqlx::query(
        "INSERT INTO deactivations (id, entity_kind, entity_id, reason, recorded_by) \
         VALUES ($1, 'product', $2, $3, $4)",
    )
    .bind(Uuid::now_v7())
    .bind(id)
    .bind(reason)
    .bind(recorded_by)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Row-locked fetch used inside the checkout transaction; the lock covers
/// the stock check-then-decrement.
pub async fn lock_product(conn: &mut PgConnection, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn decrement_stock(conn: &mut PgConnection, id: Uuid, by: i32) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock_on_hand = stock_on_hand - $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(by)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn list_categories(db: &PgPool) -> Result<Vec<Category>, ApiError> {
    Ok(sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(db)
        .await?)
}

pub async fn insert_category(db: &PgPool, name: &str, description: Option<&str>) -> Result<Category, ApiError> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, description) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(name)
    .bind(description)
    .fetch_one(db)
    .await?;
    Ok(category)
}
