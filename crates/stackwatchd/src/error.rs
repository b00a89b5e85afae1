//! HTTP error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use stackwatch_cloud::ProvisioningError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Failed to create stack: {0}")]
    CreationFailed(String),

    #[error("Failed to start stack deletion: {0}")]
    DeletionFailed(String),
}

impl ApiError {
    pub fn creation(err: ProvisioningError) -> Self {
        match err {
            ProvisioningError::InvalidTenant(reason) => ApiError::BadRequest(reason),
            other => ApiError::CreationFailed(other.to_string()),
        }
    }

    pub fn deletion(err: ProvisioningError) -> Self {
        ApiError::DeletionFailed(err.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::CreationFailed(_) | ApiError::DeletionFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
