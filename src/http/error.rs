use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::application::AppError;
use crate::domain::ValidationError;

/// Everything a handler can fail with, mapped to a status code in one place.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request: bad JSON, bad field, bad id
    Unprocessable(String),
    /// Route matched but the resource cannot exist (e.g. an unparseable id)
    NotFound,
    App(AppError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Unprocessable(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::App(err) => match err {
                AppError::AccountNotFound(_) => StatusCode::NOT_FOUND,
                AppError::LimitExceeded { .. } | AppError::Invalid(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                // Provisioning never runs behind the gateway.
                AppError::AccountAlreadyExists(_) | AppError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Unprocessable(message) => message,
            ApiError::NotFound => "not found".to_string(),
            // Store details stay in the logs.
            ApiError::App(AppError::Database(err)) => {
                error!(error = ?err, "store failure");
                "internal error".to_string()
            }
            ApiError::App(err) => err.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
