//! Users: customers and administrators as explicit variants.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A user account. Role-specific fields live on the variant; callers match
/// instead of downcasting.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum User {
    Customer(Customer),
    Admin(Admin),
}

#[derive(Clone, Debug, Serialize)]
pub struct Customer {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub job_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn id(&self) -> Uuid {
        match self {
            User::Customer(c) => c.id,
            User::Admin(a) => a.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            User::Customer(c) => &c.email,
            User::Admin(a) => &a.email,
        }
    }

    pub fn full_name(&self) -> String {
        match self {
            User::Customer(c) => format!("{} {}", c.first_name, c.last_name),
            User::Admin(a) => format!("{} {}", a.first_name, a.last_name),
        }
    }

    pub fn as_customer(&self) -> Option<&Customer> {
        match self {
            User::Customer(c) => Some(c),
            User::Admin(_) => None,
        }
    }
}

impl Customer {
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }
}
