//! Core data models for the calculator engine.
//!
//! This module contains the schema model, the validated parameter set, the
//! raw calculation result and the response envelope shared by every surface.

mod params;
mod response;
mod result;
mod spec;
mod violation;

pub use params::{ParamValue, ValidatedParameters};
pub use response::{CalculationResponse, RequestContext, ResponseMetadata};
pub use result::CalculationResult;
pub use spec::{CalculatorSpec, CalculatorSummary, FieldSpec, FieldType, UnitSystemSelector};
pub use violation::{Violation, ViolationKind};
