//! The dispatcher: the single entry point shared by every surface.
//!
//! A dispatch resolves the calculator, validates the raw parameters, invokes
//! the calculation function and normalizes its result. Nothing reaches a
//! calculation function except through here.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::calculators;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculationResponse, CalculationResult, CalculatorSpec, CalculatorSummary, RequestContext,
    ValidatedParameters,
};

use super::normalizer::normalize;
use super::registry::{Registry, RegistryEntry};
use super::units::UnitConverter;
use super::validation::validate;

/// Routes calculation requests to registered calculators.
///
/// Cheap to clone; the registry and converter are shared.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    converter: Arc<UnitConverter>,
}

impl Dispatcher {
    /// Creates a dispatcher over a sealed registry.
    ///
    /// Fails with `NotReady` if the registry has not been sealed.
    pub fn new(registry: Arc<Registry>, converter: Arc<UnitConverter>) -> EngineResult<Self> {
        if !registry.is_sealed() {
            return Err(EngineError::NotReady);
        }
        Ok(Self {
            registry,
            converter,
        })
    }

    /// Builds a dispatcher over the built-in calculators.
    ///
    /// The converter starts from the default table and gains every
    /// conversion listed in the configuration.
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let mut converter = UnitConverter::with_defaults();
        for unit in &config.units {
            converter.register(&unit.from, &unit.to, unit.factor, unit.offset)?;
        }

        let mut registry = Registry::new();
        calculators::register_builtin(&mut registry)?;
        registry.seal(&converter)?;

        Self::new(Arc::new(registry), Arc::new(converter))
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the unit converter.
    pub fn converter(&self) -> &UnitConverter {
        &self.converter
    }

    /// Lists the registered calculators in name order.
    pub fn list(&self) -> EngineResult<Vec<CalculatorSummary>> {
        Ok(self
            .registry
            .list()?
            .into_iter()
            .map(CalculatorSummary::from)
            .collect())
    }

    /// Returns the full spec of one calculator.
    pub fn describe(&self, name: &str) -> EngineResult<CalculatorSpec> {
        Ok(self.registry.lookup(name)?.spec.clone())
    }

    /// Runs a calculator with no request context.
    pub fn dispatch(&self, name: &str, raw: &Value) -> EngineResult<CalculationResponse> {
        self.dispatch_with_context(name, raw, &RequestContext::default())
    }

    /// Runs a calculator and copies `context` into the response metadata.
    ///
    /// # Errors
    ///
    /// - `CalculatorNotFound` if no calculator has this exact name
    /// - `ValidationError` with every violation found
    /// - `CalculationFailed` if the calculation returns an error, panics or
    ///   produces no result
    pub fn dispatch_with_context(
        &self,
        name: &str,
        raw: &Value,
        context: &RequestContext,
    ) -> EngineResult<CalculationResponse> {
        let entry = self.registry.lookup(name)?;
        let params = validate(&entry.spec, raw, &self.converter, &entry.cross_field_rules)?;

        let start_time = Instant::now();
        let result = invoke(&entry, &params)?;
        let response = normalize(&entry.spec, result, context)?;

        debug!(
            calculator = %name,
            duration_us = start_time.elapsed().as_micros(),
            "Calculation completed"
        );
        Ok(response)
    }
}

fn invoke(entry: &RegistryEntry, params: &ValidatedParameters) -> EngineResult<CalculationResult> {
    let failed = |cause: String| {
        warn!(calculator = %entry.spec.name, cause = %cause, "Calculation failed");
        EngineError::CalculationFailed {
            name: entry.spec.name.clone(),
            cause,
        }
    };

    match panic::catch_unwind(AssertUnwindSafe(|| (entry.calculate)(params))) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(failed(err.to_string())),
        Err(payload) => Err(failed(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
