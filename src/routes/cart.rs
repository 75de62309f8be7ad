//! Cart endpoints, keyed by customer.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::store::cart::{self, CartLineView};
use crate::store::customers;
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<CartLineView>>, ApiError> {
    customers::fetch_active_customer(&state.db, customer_id).await?;
    Ok(Json(cart::list_lines(&state.db, customer_id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

pub async fn add(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(request): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartLineView>), ApiError> {
    request.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    customers::fetch_active_customer(&state.db, customer_id).await?;
    let line = cart::add_line(&state.db, customer_id, request.product_id, request.quantity).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 0))]
    pub quantity: i32,
}

/// Quantity 0 removes the line and answers 204.
pub async fn update(
    State(state): State<AppState>,
    Path((customer_id, product_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<axum::response::Response, ApiError> {
    use axum::response::IntoResponse;

    request.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    customers::fetch_active_customer(&state.db, customer_id).await?;
    match cart::update_quantity(&state.db, customer_id, product_id, request.quantity).await? {
        Some(line) => Ok(Json(line).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn remove(
    State(state): State<AppState>,
    Path((customer_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    customers::fetch_active_customer(&state.db, customer_id).await?;
    cart::remove_line(&state.db, customer_id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    customers::fetch_active_customer(&state.db, customer_id).await?;
    cart::clear(&state.db, customer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
