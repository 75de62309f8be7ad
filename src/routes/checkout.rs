//! Checkout endpoint: cart in, payment preference out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::checkout::{self, CheckoutCommand};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub payment_method: String,
    pub customer_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub preference_id: String,
    pub init_point: Option<String>,
    pub sandbox_init_point: Option<String>,
}

pub async fn confirm(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    request.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let confirmed = checkout::confirm_cart(
        &state.db,
        state.gateway.as_ref(),
        &state.config,
        CheckoutCommand {
            customer_id: request.customer_id,
            payment_method: request.payment_method,
            customer_notes: request.customer_notes,
        },
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id: confirmed.order_id,
            order_number: confirmed.order_number,
            preference_id: confirmed.preference.preference_id,
            init_point: confirmed.preference.init_point,
            sandbox_init_point: confirmed.preference.sandbox_init_point,
        }),
    ))
}
