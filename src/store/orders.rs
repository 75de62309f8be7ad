//! Orders, line items and status history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::order::OrderLineDraft;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: Uuid,
    pub order_number: String,
    pub ordered_at: DateTime<Utc>,
    pub customer_name: String,
    pub status: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusChange {
    pub status: String,
    pub changed_by: String,
    pub notes: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
struct OrderHeader {
    id: Uuid,
    order_number: String,
    customer_id: Uuid,
    customer_name: String,
    customer_email: String,
    ordered_at: DateTime<Utc>,
    status: String,
    payment_method: String,
    customer_notes: String,
    admin_notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub ordered_at: DateTime<Utc>,
    pub status: String,
    pub payment_method: String,
    pub customer_notes: String,
    pub admin_notes: String,
    pub items: Vec<OrderItemRow>,
    pub history: Vec<StatusChange>,
}

const HEADER_QUERY: &str = "SELECT o.id, o.order_number, o.customer_id, \
    u.first_name || ' ' || u.last_name AS customer_name, u.email AS customer_email, \
    o.ordered_at, s.name AS status, o.payment_method, o.customer_notes, o.admin_notes \
    FROM orders o \
    JOIN users u ON u.id = o.customer_id \
    JOIN order_statuses s ON s.id = o.status_id";

pub async fn list_orders(db: &PgPool, page: u32, per_page: u32) -> Result<(Vec<OrderSummary>, i64), ApiError> {
    let orders = sqlx::query_as::<_, OrderSummary>(
        "SELECT o.id, o.order_number, o.ordered_at, \
         u.first_name || ' ' || u.last_name AS customer_name, s.name AS status, o.payment_method \
         FROM orders o \
         JOIN users u ON u.id = o.customer_id \
         JOIN order_statuses s ON s.id = o.status_id \
         ORDER BY o.ordered_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(per_page as i64)
    .bind(((page - 1) * per_page) as i64)
    .fetch_all(db)
    .await?;
    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders").fetch_one(db).await?;
    Ok((orders, total.0))
}

pub async fn get_order(db: &PgPool, id: Uuid) -> Result<Option<OrderDetail>, ApiError> {
    let header = sqlx::query_as::<_, OrderHeader>(&format!("{HEADER_QUERY} WHERE o.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    let Some(header) = header else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, product_id, product_name, quantity, unit_price FROM order_items \
         WHERE order_id = $1 ORDER BY product_name",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    let history = sqlx::query_as::<_, StatusChange>(
        "SELECT s.name AS status, h.changed_by, h.notes, h.changed_at \
         FROM order_status_history h JOIN order_statuses s ON s.id = h.status_id \
         WHERE h.order_id = $1 ORDER BY h.changed_at ASC",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    Ok(Some(OrderDetail {
        id: header.id,
        order_number: header.order_number,
        customer_id: header.customer_id,
        customer_name: header.customer_name,
        customer_email: header.customer_email,
        ordered_at: header.ordered_at,
        status: header.status,
        payment_method: header.payment_method,
        customer_notes: header.customer_notes,
        admin_notes: header.admin_notes,
        items,
        history,
    }))
}

/// Moves an order to a named status and records who did it and why.
pub async fn update_status(
    db: &PgPool,
    order_id: Uuid,
    status_name: &str,
    notes: &str,
    changed_by: &str,
) -> Result<OrderDetail, ApiError> {
    let mut tx = db.begin().await?;
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound(format!("order {order_id} not found")));
    }

    let status_id = resolve_status_id(&mut *tx, status_name)
        .await?
        .ok_or_else(|| ApiError::InvalidState(format!("unknown order status '{status_name}'")))?;

    sqlx::query("UPDATE orders SET status_id = $2 WHERE id = $1")
        .bind(order_id)
        .bind(status_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "INSERT INTO order_status_history (id, order_id, status_id, changed_by, notes) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(status_id)
    .bind(changed_by)
    .bind(notes)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    get_order(db, order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))
}

pub async fn resolve_status_id(conn: &mut PgConnection, name: &str) -> Result<Option<i32>, sqlx::Error> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM order_statuses WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|(id,)| id))
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status_id: i32,
    pub payment_method: String,
    pub customer_notes: String,
}

pub async fn insert_order(conn: &mut PgConnection, new: &NewOrder) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, customer_id, status_id, payment_method, customer_notes, admin_notes) \
         VALUES ($1, $2, $3, $4, $5, $6, '')",
    )
    .bind(new.id)
    .bind(&new.order_number)
    .bind(new.customer_id)
    .bind(new.status_id)
    .bind(&new.payment_method)
    .bind(&new.customer_notes)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_order_item(
    conn: &mut PgConnection,
    order_id: Uuid,
    line: &OrderLineDraft,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, product_name, quantity, unit_price) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(line.product_id)
    .bind(&line.product_name)
    .bind(line.quantity)
    .bind(line.unit_price)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub fn next_order_number() -> String {
    format!("ORD-{:08}", rand::random::<u32>())
}
