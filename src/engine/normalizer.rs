//! Response normalization.

use chrono::Utc;
use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationResponse, CalculationResult, CalculatorSpec, RequestContext, ResponseMetadata};

/// Wraps a raw result in the standard envelope.
///
/// Declared outputs the calculator left empty take their declared default, or
/// `null`. `tags` appears only when the spec declares it. A `null` result is a
/// `CalculationFailed`.
pub fn normalize(
    spec: &CalculatorSpec,
    result: CalculationResult,
    context: &RequestContext,
) -> EngineResult<CalculationResponse> {
    if result.result.is_null() {
        return Err(EngineError::CalculationFailed {
            name: spec.name.clone(),
            cause: "calculator returned no result".to_string(),
        });
    }

    let working = if result.working.is_null() {
        declared_default(spec, "working").unwrap_or(Value::Null)
    } else {
        result.working
    };

    let interpretation = result
        .interpretation
        .or_else(|| declared_string(spec, "interpretation"));
    let reference = result
        .reference
        .or_else(|| declared_string(spec, "reference"));

    let tags = spec.declares_output("tags").then(|| {
        if result.tags.is_empty() {
            declared_default(spec, "tags")
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default()
        } else {
            result.tags
        }
    });

    Ok(CalculationResponse {
        result: result.result,
        working,
        interpretation,
        reference,
        metadata: ResponseMetadata {
            timestamp: Utc::now(),
            version: spec.version.clone(),
            calculator_name: spec.name.clone(),
            language: context.language.clone(),
            client: context.client.clone(),
        },
        tags,
    })
}

fn declared_default(spec: &CalculatorSpec, slot: &str) -> Option<Value> {
    spec.output(slot).and_then(|field| field.default.clone())
}

fn declared_string(spec: &CalculatorSpec, slot: &str) -> Option<String> {
    declared_default(spec, slot).and_then(|v| v.as_str().map(str::to_string))
}
