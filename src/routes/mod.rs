//! HTTP handlers
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod customers;
pub mod orders;
pub mod products;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListParams {
    /// Page is 1-based; page size is capped at 100.
    pub fn normalize(&self) -> (u32, u32) {
        (self.page.unwrap_or(1).max(1), self.per_page.unwrap_or(20).clamp(1, 100))
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}
