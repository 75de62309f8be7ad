//! Category endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;
use crate::store::catalog::{self, Category};
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    request.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let category = catalog::insert_category(&state.db, &request.name, request.description.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(category)))
}
