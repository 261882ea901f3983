//! The calculator engine.
//!
//! This module contains the unit converter, the validation engine, the
//! registry, the response normalizer and the dispatcher that ties them
//! together, plus the process-wide dispatcher used by the library surface.

mod dispatcher;
mod normalizer;
mod registry;
mod units;
mod validation;

pub use dispatcher::Dispatcher;
pub use normalizer::normalize;
pub use registry::{CalculateFn, ENVELOPE_SLOTS, Registry, RegistryEntry};
pub use units::{Conversion, KG_PER_LB, M_PER_IN, UnitConverter};
pub use validation::{CrossFieldRule, validate};

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::models::CalculationResponse;

static DEFAULT_DISPATCHER: OnceCell<Dispatcher> = OnceCell::new();

/// Returns the process-wide dispatcher over the built-in calculators.
///
/// Built with the default configuration on first use.
pub fn default_dispatcher() -> EngineResult<&'static Dispatcher> {
    DEFAULT_DISPATCHER.get_or_try_init(|| Dispatcher::from_config(&EngineConfig::default()))
}

/// Runs a built-in calculator directly.
///
/// # Example
///
/// ```
/// use serde_json::json;
///
/// let response = clinical_calculators::dispatch(
///     "bmi",
///     &json!({"weight": 70, "height": 1.75, "unit_system": "metric"}),
/// )
/// .unwrap();
///
/// assert_eq!(response.result, json!(22.86));
/// assert_eq!(response.interpretation.as_deref(), Some("Normal"));
/// ```
pub fn dispatch(name: &str, params: &Value) -> EngineResult<CalculationResponse> {
    default_dispatcher()?.dispatch(name, params)
}
