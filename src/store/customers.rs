//! User accounts: lookups, registration, soft delete.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::user::{Admin, Customer, User};
use crate::error::ApiError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub job_title: Option<String>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> Result<User, ApiError> {
        match self.role.as_str() {
            "customer" => Ok(User::Customer(Customer {
                id: self.id,
                email: self.email,
                first_name: self.first_name,
                last_name: self.last_name,
                phone: self.phone,
                street: self.street,
                street_number: self.street_number,
                city: self.city,
                province: self.province,
                deactivated_at: self.deactivated_at,
                created_at: self.created_at,
            })),
            "admin" => Ok(User::Admin(Admin {
                id: self.id,
                email: self.email,
                first_name: self.first_name,
                last_name: self.last_name,
                job_title: self.job_title,
                created_at: self.created_at,
            })),
            other => Err(ApiError::Fatal(format!("unknown role '{}' on user {}", other, self.id))),
        }
    }
}

pub async fn find_user(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?;
    row.map(UserRow::into_user).transpose()
}

/// Resolves the customer the cart and checkout operate on. Deactivated
/// accounts and admins are treated as absent.
pub async fn fetch_active_customer(db: &PgPool, id: Uuid) -> Result<Customer, ApiError> {
    match find_user(db, id).await? {
        Some(User::Customer(c)) if c.is_active() => Ok(c),
        _ => Err(ApiError::NotFound(format!("customer {id} not found"))),
    }
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
}

pub async fn insert_customer(db: &PgPool, new: &NewCustomer) -> Result<Customer, ApiError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, email, role, first_name, last_name, phone, street, street_number, city, province) \
         VALUES ($1, $2, 'customer', $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&new.email)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.phone)
    .bind(&new.street)
    .bind(&new.street_number)
    .bind(&new.city)
    .bind(&new.province)
    .fetch_one(db)
    .await?;
    match row.into_user()? {
        User::Customer(c) => Ok(c),
        User::Admin(_) => Err(ApiError::Fatal("registration produced a non-customer row".into())),
    }
}

/// Soft delete: the row stays, a deactivation record explains why.
pub async fn deactivate_customer(
    db: &PgPool,
    id: Uuid,
    reason: &str,
    recorded_by: &str,
) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;
    let updated = sqlx::query(
        "UPDATE users SET deactivated_at = NOW() \
         WHERE id = $1 AND role = 'customer' AND deactivated_at IS NULL",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(ApiError::NotFound(format!("customer {id} not found")));
    }
    sqlx::query(
        "INSERT INTO deactivations (id, entity_kind, entity_id, reason, recorded_by) \
         VALUES ($1, 'customer', $2, $3, $4)",
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
