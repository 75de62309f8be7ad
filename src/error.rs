//! Error taxonomy shared by the routes and the checkout workflow.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::payment::GatewayError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    /// A business rule rejected the request (empty cart, insufficient stock,
    /// nothing billable).
    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Validation(String),

    #[error("payment gateway failure: {0}")]
    PaymentGateway(#[from] GatewayError),

    /// Required reference data is missing; the deployment is misconfigured.
    #[error("{0}")]
    Fatal(String),

    #[error("database failure")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidState(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::PaymentGateway(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Fatal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(e) => tracing::error!("database failure: {e}"),
            ApiError::Fatal(msg) => tracing::error!("misconfiguration: {msg}"),
            ApiError::PaymentGateway(e) => tracing::error!("payment gateway failure: {e}"),
            ApiError::NotFound(msg) | ApiError::InvalidState(msg) | ApiError::Validation(msg) => {
                tracing::warn!("request rejected: {msg}");
            }
        }
        let message = match &self {
            // Driver-level detail stays in the logs.
            ApiError::Database(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        (self.status_code(), Json(serde_json::json!({ "error": message }))).into_response()
    }
}
