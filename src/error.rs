use axum::{http::StatusCode, response::Response, Json};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

use crate::middleware::logging::{to_response, ApiError};
use crate::payment::PaymentError;

/// Failures raised by the stores and the checkout flow.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("A request for {0} is already in progress")]
    InFlight(String),
    #[error("Payment failed: {0}")]
    Payment(String),
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InFlight(_) => StatusCode::CONFLICT,
            StoreError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
        }
    }

    /// Renders the error as `{"error": ...}` and tags the response for the logging middleware.
    pub fn into_api_response(self) -> Response {
        let status = self.status();
        // database details stay in the logs
        let message = match &self {
            StoreError::Db(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let ext = match &self {
            StoreError::Db(err) => ApiError::DbError(err.to_string()),
            StoreError::Validation(msg) => ApiError::ValidationFail(msg.clone()),
            other => ApiError::General(other.to_string()),
        };
        to_response((status, Json(json!({ "error": message }))), Err(ext))
    }
}

impl From<PaymentError> for StoreError {
    fn from(err: PaymentError) -> Self {
        StoreError::Payment(err.to_string())
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        StoreError::Validation(errors.to_string())
    }
}
