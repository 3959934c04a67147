use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::flisr::FlisrError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Distance estimator rejected the stored line parameters or timestamps
    #[error("Calculation error: {0}")]
    CalculationError(String),

    /// Persist step rolled back
    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::CalculationError(_)
            | ApiError::TransactionError(_)
            | ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::CalculationError(_) => "CalculationError",
            ApiError::TransactionError(_) => "TransactionError",
            ApiError::InternalError(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let message = match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            ApiError::CalculationError(_) | ApiError::TransactionError(_) => {
                tracing::error!(error = %self, "FLISR run failed");
                self.to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error_type.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<FlisrError> for ApiError {
    fn from(error: FlisrError) -> Self {
        match error {
            FlisrError::InvalidParameter(_) | FlisrError::Precision(_) => {
                ApiError::CalculationError(error.to_string())
            }
            FlisrError::NotFound(msg) => ApiError::NotFound(msg),
            FlisrError::Transaction(msg) => ApiError::TransactionError(msg),
            FlisrError::Store(e) => ApiError::InternalError(format!("{:#}", e)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}
