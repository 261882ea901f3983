//! Request types for the calculator API.
//!
//! This module defines the JSON request structures for the `/calculate` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::RequestContext;

/// Request body for the `/calculate` endpoint.
///
/// `params` is passed to the validation engine untouched, so type and range
/// problems inside it are reported as violations rather than parse errors.
///
/// # Example
///
/// ```
/// use clinical_calculators::api::CalculateRequest;
///
/// let request: CalculateRequest = serde_json::from_str(
///     r#"{"calculator": "bmi", "params": {"weight": 70, "height": 1.75, "unit_system": "metric"}}"#,
/// )
/// .unwrap();
/// assert_eq!(request.calculator, "bmi");
/// assert!(request.context.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// Name of the calculator to run.
    pub calculator: String,
    /// Raw calculator parameters.
    #[serde(default)]
    pub params: Value,
    /// Optional caller context copied into the response metadata.
    #[serde(default)]
    pub context: Option<RequestContext>,
}
