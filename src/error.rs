//! Error types for the calculator engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every error condition that can occur while loading configuration,
//! building the registry, validating parameters and running calculators.

use thiserror::Error;

use crate::models::Violation;

/// The main error type for the calculator engine.
///
/// All operations in the engine return this error type, so every surface
/// (HTTP, CLI and direct library calls) handles failures the same way.
///
/// # Example
///
/// ```
/// use clinical_calculators::error::EngineError;
///
/// let error = EngineError::CalculatorNotFound {
///     name: "nonexistent_calc".to_string(),
/// };
/// assert_eq!(error.to_string(), "Calculator not found: nonexistent_calc");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path (or embedded source name) that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// No calculator is registered under the requested name.
    #[error("Calculator not found: {name}")]
    CalculatorNotFound {
        /// The requested calculator name.
        name: String,
    },

    /// One or more input parameters failed validation.
    #[error("Validation failed with {} violation(s): {}", .violations.len(), summarize(.violations))]
    ValidationError {
        /// Every violation found, in field declaration order.
        violations: Vec<Violation>,
    },

    /// No direct conversion is registered for the unit pair.
    #[error("Unsupported unit conversion from '{from}' to '{to}'")]
    UnsupportedConversion {
        /// The unit the value was supplied in.
        from: String,
        /// The unit the value was to be converted to.
        to: String,
    },

    /// A unit conversion could not be registered.
    #[error("Invalid unit conversion from '{from}' to '{to}': {message}")]
    InvalidUnitConversion {
        /// The source unit.
        from: String,
        /// The target unit.
        to: String,
        /// Why the conversion was rejected.
        message: String,
    },

    /// A calculation function failed or returned an inconsistent result.
    #[error("Calculation '{name}' failed: {cause}")]
    CalculationFailed {
        /// The calculator name.
        name: String,
        /// A description of the failure.
        cause: String,
    },

    /// Two calculators declared the same name.
    #[error("Duplicate calculator name: {name}")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// A calculator spec is structurally invalid.
    #[error("Invalid spec for calculator '{name}': {message}")]
    InvalidSpec {
        /// The calculator name.
        name: String,
        /// What is wrong with the spec.
        message: String,
    },

    /// The registry has not finished loading.
    #[error("Calculator registry is not ready")]
    NotReady,

    /// Registration was attempted after the registry was sealed.
    #[error("Cannot register '{name}': registry is already sealed")]
    RegistrySealed {
        /// The calculator that was being registered.
        name: String,
    },

    /// A calculation function read a validated parameter with the wrong shape.
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// A description of the mismatch.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({}): {}", v.field, v.kind, v.detail))
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    /// Returns the violations carried by a validation error, if any.
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            EngineError::ValidationError { violations } => Some(violations),
            _ => None,
        }
    }
}
