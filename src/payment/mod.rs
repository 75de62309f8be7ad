//! Payment gateway seam
pub mod mercado_pago;

pub use mercado_pago::MercadoPago;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote API rejected the request.
    #[error("gateway rejected the request ({status}): {body}")]
    Api { status: u16, body: String },

    /// The gateway could not be reached (timeout, connection failure,
    /// unparseable response).
    #[error("gateway unreachable: {0}")]
    Transport(String),

    /// The adapter itself is misconfigured (e.g. missing access token).
    #[error("gateway misconfigured: {0}")]
    Config(String),
}

/// What the checkout workflow submits for payment: only billable lines.
#[derive(Clone, Debug)]
pub struct PreferenceRequest {
    pub order_id: Uuid,
    pub items: Vec<BillableItem>,
    pub payer: Payer,
    pub back_urls: BackUrls,
}

#[derive(Clone, Debug)]
pub struct BillableItem {
    pub product_id: Uuid,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Clone, Debug)]
pub struct Payer {
    pub name: String,
    pub surname: String,
    pub email: String,
}

/// Where the gateway sends the buyer back after payment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// The gateway's redirectable handle for one payment request.
#[derive(Clone, Debug, Serialize)]
pub struct PreferenceHandle {
    pub preference_id: String,
    pub init_point: Option<String>,
    pub sandbox_init_point: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_preference(&self, request: PreferenceRequest) -> Result<PreferenceHandle, GatewayError>;
}
