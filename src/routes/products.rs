//! Product catalog endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::store::catalog::{self, NewProduct, Product};
use crate::AppState;

use super::{ListParams, PaginatedResponse};

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Product>>, ApiError> {
    let (page, per_page) = params.normalize();
    let (products, total) = catalog::list_products(&state.db, page, per_page).await?;
    Ok(Json(PaginatedResponse { data: products, total, page }))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>, ApiError> {
    catalog::get_product(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub sell_price: Decimal,
    pub cost_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock_on_hand: i32,
    #[validate(range(min = 0))]
    pub reorder_point: Option<i32>,
}

impl ProductRequest {
    fn into_new(self) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            category_id: self.category_id,
            sell_price: self.sell_price,
            cost_price: self.cost_price,
            stock_on_hand: self.stock_on_hand,
            reorder_point: self.reorder_point.unwrap_or(0),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    request.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let product = catalog::insert_product(&state.db, &request.into_new()).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<Product>, ApiError> {
    request.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let product = catalog::update_product(&state.db, id, &request.into_new()).await?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize, Default)]
pub struct DiscontinueRequest {
    pub reason: Option<String>,
}

pub async fn discontinue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<DiscontinueRequest>>,
) -> Result<StatusCode, ApiError> {
    let reason = body.and_then(|Json(b)| b.reason).unwrap_or_else(|| "discontinued".to_string());
    catalog::discontinue_product(&state.db, id, &reason, &state.config.admin_email).await?;
    Ok(StatusCode::NO_CONTENT)
}
