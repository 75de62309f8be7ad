//! Admin-side order endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::store::orders::{self, OrderDetail, OrderSummary};
use crate::AppState;

use super::{ListParams, PaginatedResponse};

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<OrderSummary>>, ApiError> {
    let (page, per_page) = params.normalize();
    let (orders, total) = orders::list_orders(&state.db, page, per_page).await?;
    Ok(Json(PaginatedResponse { data: orders, total, page }))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<OrderDetail>, ApiError> {
    orders::get_order(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, max = 50))]
    pub status: String,
    pub notes: Option<String>,
}

/// Status changes are recorded in the history with the configured admin
/// identity.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderDetail>, ApiError> {
    request.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let detail = orders::update_status(
        &state.db,
        id,
        &request.status,
        request.notes.as_deref().unwrap_or(""),
        &state.config.admin_email,
    )
    .await?;
    Ok(Json(detail))
}
