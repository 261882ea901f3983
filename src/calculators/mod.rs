//! Built-in calculators.
//!
//! Each calculator is a YAML spec sidecar, a pure calculation function and
//! optional cross-field rules. [`register_builtin`] is the explicit startup
//! list that feeds them to the registry.

pub mod bmi;
pub mod dcct_ifcc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::engine::Registry;
use crate::error::{EngineError, EngineResult};

/// Registers every built-in calculator.
pub fn register_builtin(registry: &mut Registry) -> EngineResult<()> {
    registry.register_entry(bmi::entry()?)?;
    registry.register_entry(dcct_ifcc::entry()?)?;
    Ok(())
}

/// Converts a validated parameter to a decimal.
pub(crate) fn decimal(name: &str, value: f64) -> EngineResult<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| EngineError::InvalidParameter {
        name: name.to_string(),
        message: format!("{} cannot be represented as a decimal", value),
    })
}

/// Rounds to 2 decimal places, halves away from zero.
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a decimal result to a JSON number.
///
/// Goes through the decimal text so `22.86` becomes the nearest `f64`.
pub(crate) fn number(name: &str, value: Decimal) -> EngineResult<Value> {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::from)
        .ok_or_else(|| EngineError::InvalidParameter {
            name: name.to_string(),
            message: format!("{} cannot be represented as a number", value),
        })
}

/// Formats a decimal with at least one fractional digit (`7` → `7.0`).
pub(crate) fn display(value: Decimal) -> String {
    let value = value.normalize();
    if value.scale() == 0 {
        format!("{}.0", value)
    } else {
        value.to_string()
    }
}
