//! Customer account endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::user::{Customer, User};
use crate::error::ApiError;
use crate::store::customers::{self, NewCustomer};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub street_number: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    request.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let customer = customers::insert_customer(
        &state.db,
        &NewCustomer {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            street: request.street,
            street_number: request.street_number,
            city: request.city,
            province: request.province,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<User>, ApiError> {
    customers::find_user(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

#[derive(Debug, Deserialize, Default)]
pub struct DeactivateRequest {
    pub reason: Option<String>,
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<DeactivateRequest>>,
) -> Result<StatusCode, ApiError> {
    let reason = body.and_then(|Json(b)| b.reason).unwrap_or_else(|| "deactivated".to_string());
    customers::deactivate_customer(&state.db, id, &reason, &state.config.admin_email).await?;
    Ok(StatusCode::NO_CONTENT)
}
