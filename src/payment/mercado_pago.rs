//! Mercado Pago checkout-preference client.
//!
//! One preference is created per confirmed order: items carry the frozen
//! order prices in ARS, the payer block identifies the buyer, and the back
//! URLs return the buyer to the storefront after payment.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::MercadoPagoConfig;

use super::{GatewayError, PaymentGateway, PreferenceHandle, PreferenceRequest};

const CURRENCY: &str = "ARS";
const ITEM_DESCRIPTION: &str = "GreenThumb Market product";

pub struct MercadoPago {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl MercadoPago {
    pub fn new(config: &MercadoPagoConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct PreferenceBody {
    items: Vec<ItemBody>,
    payer: PayerBody,
    back_urls: BackUrlsBody,
}

#[derive(Debug, Serialize)]
struct ItemBody {
    id: String,
    title: String,
    description: &'static str,
    quantity: u32,
    currency_id: &'static str,
    unit_price: Decimal,
}

#[derive(Debug, Serialize)]
struct PayerBody {
    name: String,
    surname: String,
    email: String,
}

#[derive(Debug, Serialize)]
struct BackUrlsBody {
    success: String,
    failure: String,
    pending: String,
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
    id: String,
    #[serde(default)]
    init_point: Option<String>,
    #[serde(default)]
    sandbox_init_point: Option<String>,
}

fn build_body(request: &PreferenceRequest) -> PreferenceBody {
    PreferenceBody {
        items: request
            .items
            .iter()
            .map(|item| ItemBody {
                id: item.product_id.to_string(),
                title: item.title.clone(),
                description: ITEM_DESCRIPTION,
                quantity: item.quantity,
                currency_id: CURRENCY,
                unit_price: item.unit_price,
            })
            .collect(),
        payer: PayerBody {
            name: request.payer.name.clone(),
            surname: request.payer.surname.clone(),
            email: request.payer.email.clone(),
        },
        back_urls: BackUrlsBody {
            success: request.back_urls.success.clone(),
            failure: request.back_urls.failure.clone(),
            pending: request.back_urls.pending.clone(),
        },
    }
}

#[async_trait]
impl PaymentGateway for MercadoPago {
    async fn create_preference(&self, request: PreferenceRequest) -> Result<PreferenceHandle, GatewayError> {
        if self.access_token.trim().is_empty() {
            return Err(GatewayError::Config("MP_ACCESS_TOKEN is not set".into()));
        }
        if request.items.is_empty() {
            return Err(GatewayError::Config("refusing to create a preference with no items".into()));
        }

        debug!(order_id = %request.order_id, items = request.items.len(), "creating payment preference");
        let response = self
            .http
            .post(format!("{}/checkout/preferences", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&build_body(&request))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, order_id = %request.order_id, "mercado pago rejected the preference: {body}");
            return Err(GatewayError::Api { status: status.as_u16(), body });
        }

        let preference: PreferenceResponse =
            response.json().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
        info!(order_id = %request.order_id, preference_id = %preference.id, "payment preference created");
        Ok(PreferenceHandle {
            preference_id: preference.id,
            init_point: preference.init_point,
            sandbox_init_point: preference.sandbox_init_point,
        })
    }
}
