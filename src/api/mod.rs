//! HTTP API module for the calculator engine.
//!
//! This module provides the REST endpoints: `POST /calculate`,
//! `GET /calculators`, `GET /calculators/:name` and `GET /health`.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::CalculateRequest;
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
