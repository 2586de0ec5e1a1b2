use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Geocoding provider errors, split by whether the queue should retry.
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Provider timed out")]
    Timeout,

    #[error("Provider network error: {0}")]
    Network(String),

    #[error("Provider rate limited")]
    RateLimited,

    #[error("Provider rejected request: {0}")]
    Rejected(String),

    #[error("Provider response malformed: {0}")]
    Malformed(String),
}

impl GeocodeError {
    /// Transient failures are surfaced to the queue's retry policy;
    /// everything else is logged and the label left unresolved.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GeocodeError::Timeout | GeocodeError::Network(_) | GeocodeError::RateLimited
        )
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            GeocodeError::Timeout
        } else {
            GeocodeError::Network(format!("{:?}", error))
        }
    }
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {}", what),
            ),
            AppError::InvalidInput(reason) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                format!("Invalid input: {}", reason),
            ),
            AppError::Geocode(e) => (
                StatusCode::BAD_GATEWAY,
                "GEOCODER_ERROR",
                format!("Geocoding failed: {}", e),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details: None,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<MigrateError> for AppError {
    fn from(error: MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
