//! Environment-driven configuration, collected once at startup.

use std::time::Duration;

use anyhow::Context;

use crate::payment::BackUrls;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Identity recorded on admin-side changes such as order status updates
    /// and catalog retirements.
    pub admin_email: String,
    pub mercado_pago: MercadoPagoConfig,
    pub back_urls: BackUrls,
}

#[derive(Clone)]
pub struct MercadoPagoConfig {
    pub base_url: String,
    pub access_token: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let port = std::env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8083);
        let admin_email = env_or("ADMIN_EMAIL", "admin@greenthumb.example");

        let access_token = std::env::var("MP_ACCESS_TOKEN").unwrap_or_default();
        if access_token.trim().is_empty() {
            tracing::warn!("MP_ACCESS_TOKEN is not set; checkout will fail until it is configured");
        }
        let timeout_secs = std::env::var("MP_TIMEOUT_SECS").ok().and_then(|t| t.parse().ok()).unwrap_or(10);
        let mercado_pago = MercadoPagoConfig {
            base_url: env_or("MP_BASE_URL", "https://api.mercadopago.com"),
            access_token,
            timeout: Duration::from_secs(timeout_secs),
        };

        let back_urls = BackUrls {
            success: env_or("CHECKOUT_SUCCESS_URL", "http://localhost:3000/payment-success"),
            failure: env_or("CHECKOUT_FAILURE_URL", "http://localhost:3000/payment-failure"),
            pending: env_or("CHECKOUT_PENDING_URL", "http://localhost:3000/payment-pending"),
        };

        Ok(Self { database_url, port, admin_email, mercado_pago, back_urls })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
