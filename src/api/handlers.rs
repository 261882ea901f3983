//! HTTP request handlers for the calculator API.
//!
//! This module contains the handler functions for all API endpoints. Every
//! calculation goes through the shared [`Dispatcher`](crate::engine::Dispatcher).

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;

use super::request::CalculateRequest;
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate_handler))
        .route("/calculators", get(list_handler))
        .route("/calculators/:name", get(describe_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Handler for POST /calculate endpoint.
///
/// Accepts a calculation request and returns the standard envelope.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Response {
    // Generate correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    // Handle JSON parsing errors
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    // Get the body text which contains the detailed error from serde
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "application/json")],
                Json(error),
            )
                .into_response();
        }
    };

    let context = request.context.unwrap_or_default();
    let start_time = Instant::now();
    match state
        .dispatcher()
        .dispatch_with_context(&request.calculator, &request.params, &context)
    {
        Ok(response) => {
            info!(
                correlation_id = %correlation_id,
                calculator = %request.calculator,
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(response),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                calculator = %request.calculator,
                error = %err,
                "Calculation failed"
            );
            error_response(err)
        }
    }
}

/// Handler for GET /calculators endpoint.
async fn list_handler(State(state): State<AppState>) -> Response {
    match state.dispatcher().list() {
        Ok(calculators) => Json(json!({ "calculators": calculators })).into_response(),
        Err(err) => error_response(err),
    }
}

/// Handler for GET /calculators/:name endpoint.
async fn describe_handler(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.dispatcher().describe(&name) {
        Ok(spec) => Json(spec).into_response(),
        Err(err) => error_response(err),
    }
}

/// Handler for GET /health endpoint.
async fn health_handler(State(state): State<AppState>) -> Response {
    let registry = state.dispatcher().registry();
    if !registry.is_sealed() {
        return error_response(EngineError::NotReady);
    }
    Json(json!({ "status": "ok", "calculators": registry.len() })).into_response()
}

fn error_response(err: EngineError) -> Response {
    ApiErrorResponse::from(err).into_response()
}
