//! Response types for the calculator API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::Violation;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Every input violation, for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            violations: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            details: Some(details.into()),
            ..Self::new(code, message)
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a validation error response carrying the violation list.
    pub fn invalid_parameters(violations: Vec<Violation>) -> Self {
        Self {
            violations: Some(violations),
            ..Self::new("VALIDATION_ERROR", "Parameter validation failed")
        }
    }

    /// Creates a calculator not found error response.
    pub fn calculator_not_found(name: &str) -> Self {
        Self::with_details(
            "CALCULATOR_NOT_FOUND",
            format!("Calculator not found: {}", name),
            format!("No calculator named '{}' is registered", name),
        )
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let (status, error) = match error {
            EngineError::ValidationError { violations } => {
                (StatusCode::BAD_REQUEST, ApiError::invalid_parameters(violations))
            }
            EngineError::CalculatorNotFound { name } => {
                (StatusCode::NOT_FOUND, ApiError::calculator_not_found(&name))
            }
            EngineError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("NOT_READY", "Calculator registry is not ready"),
            ),
            err @ EngineError::CalculationFailed { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CALCULATION_FAILED", "Calculation failed", err.to_string()),
            ),
            err @ (EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", err.to_string()),
            ),
            err => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("INTERNAL_ERROR", "Internal error", err.to_string()),
            ),
        };
        ApiErrorResponse { status, error }
    }
}
