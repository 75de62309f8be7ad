//! GreenThumb Market - Garden-supplies E-commerce Backend
//!
//! ## Features
//! - Product catalog with soft-delete bookkeeping
//! - Per-customer carts with price snapshots
//! - Checkout into durable orders with Mercado Pago payment preferences
//! - Order management with status history

pub mod checkout;
pub mod config;
pub mod domain;
pub mod error;
pub mod payment;
pub mod routes;
pub mod store;

use std::sync::Arc;

use crate::config::Config;
use crate::payment::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub gateway: Arc<dyn PaymentGateway>,
    pub config: Arc<Config>,
}
