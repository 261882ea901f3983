//! The calculator registry.
//!
//! Calculators are registered once at startup, the registry is sealed, and
//! from then on it is shared read-only behind an `Arc`. Every spec is checked
//! structurally when it is registered so malformed schemas fail at startup
//! rather than on the first request.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationResult, CalculatorSpec, FieldSpec, FieldType, ValidatedParameters};

use super::units::UnitConverter;
use super::validation::CrossFieldRule;

/// A calculation function.
///
/// Receives parameters that already passed validation and returns the raw
/// result for normalization.
pub type CalculateFn = fn(&ValidatedParameters) -> EngineResult<CalculationResult>;

/// The output slots a calculator may declare.
pub const ENVELOPE_SLOTS: [&str; 5] = ["result", "working", "interpretation", "reference", "tags"];

/// A registered calculator: its schema, its function and its cross-field rules.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// The calculator's schema.
    pub spec: CalculatorSpec,
    /// The calculation function.
    pub calculate: CalculateFn,
    /// Rules checked after every field passed validation.
    pub cross_field_rules: Vec<CrossFieldRule>,
}

impl RegistryEntry {
    /// Creates an entry with no cross-field rules.
    pub fn new(spec: CalculatorSpec, calculate: CalculateFn) -> Self {
        Self {
            spec,
            calculate,
            cross_field_rules: Vec::new(),
        }
    }

    /// Adds a cross-field rule.
    pub fn with_cross_field_rule(mut self, rule: CrossFieldRule) -> Self {
        self.cross_field_rules.push(rule);
        self
    }
}

/// Maps calculator names to registry entries.
///
/// # Example
///
/// ```
/// use clinical_calculators::engine::{Registry, UnitConverter};
/// use clinical_calculators::models::{CalculationResult, CalculatorSpec, FieldSpec, FieldType, ValidatedParameters};
/// use clinical_calculators::error::EngineResult;
/// use serde_json::json;
///
/// fn double(params: &ValidatedParameters) -> EngineResult<CalculationResult> {
///     let x = params.number("x")?;
///     Ok(CalculationResult::new(json!(x * 2.0), json!(format!("{} × 2", x))))
/// }
///
/// let spec = CalculatorSpec::new("double", "1.0")
///     .with_input(FieldSpec::new("x", FieldType::Number).required())
///     .with_output(FieldSpec::new("result", FieldType::Number))
///     .with_output(FieldSpec::new("working", FieldType::String));
///
/// let mut registry = Registry::new();
/// registry.register(spec, double).unwrap();
/// registry.seal(&UnitConverter::new()).unwrap();
///
/// assert_eq!(registry.lookup("double").unwrap().spec.version, "1.0");
/// assert!(registry.lookup("triple").is_err());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, Arc<RegistryEntry>>,
    sealed: bool,
}

impl Registry {
    /// Creates an empty, unsealed registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a calculator with no cross-field rules.
    pub fn register(&mut self, spec: CalculatorSpec, calculate: CalculateFn) -> EngineResult<()> {
        self.register_entry(RegistryEntry::new(spec, calculate))
    }

    /// Registers a calculator entry.
    ///
    /// Fails with `RegistrySealed` after [`Registry::seal`], with
    /// `DuplicateName` if the name is taken, or with `InvalidSpec` if the
    /// schema is malformed.
    pub fn register_entry(&mut self, entry: RegistryEntry) -> EngineResult<()> {
        let name = entry.spec.name.clone();
        if self.sealed {
            return Err(EngineError::RegistrySealed { name });
        }
        if self.entries.contains_key(&name) {
            return Err(EngineError::DuplicateName { name });
        }
        check_spec(&entry.spec)?;
        self.entries.insert(name, Arc::new(entry));
        Ok(())
    }

    /// Checks every unit alternative against the converter and marks the
    /// registry ready for lookups.
    pub fn seal(&mut self, converter: &UnitConverter) -> EngineResult<()> {
        for entry in self.entries.values() {
            check_units(&entry.spec, converter)?;
        }
        self.sealed = true;
        info!(calculators = self.entries.len(), "Calculator registry sealed");
        Ok(())
    }

    /// Returns true once the registry has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Looks up a calculator by exact name.
    pub fn lookup(&self, name: &str) -> EngineResult<Arc<RegistryEntry>> {
        self.ensure_ready()?;
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::CalculatorNotFound {
                name: name.to_string(),
            })
    }

    /// Returns every registered spec in name order.
    pub fn list(&self) -> EngineResult<Vec<&CalculatorSpec>> {
        self.ensure_ready()?;
        Ok(self.entries.values().map(|entry| &entry.spec).collect())
    }

    /// Returns the number of registered calculators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_ready(&self) -> EngineResult<()> {
        if self.sealed {
            Ok(())
        } else {
            Err(EngineError::NotReady)
        }
    }
}

fn check_spec(spec: &CalculatorSpec) -> EngineResult<()> {
    let invalid = |message: String| EngineError::InvalidSpec {
        name: spec.name.clone(),
        message,
    };

    if !is_snake_case(&spec.name) {
        return Err(invalid(format!(
            "name '{}' must be non-empty lowercase snake_case",
            spec.name
        )));
    }
    if spec.version.trim().is_empty() {
        return Err(invalid("version must not be empty".to_string()));
    }

    let mut seen = HashSet::new();
    for field in &spec.inputs {
        if !seen.insert(field.name.as_str()) {
            return Err(invalid(format!("duplicate input '{}'", field.name)));
        }
        check_input(field).map_err(invalid)?;
    }

    let mut seen = HashSet::new();
    for field in &spec.outputs {
        if !seen.insert(field.name.as_str()) {
            return Err(invalid(format!("duplicate output '{}'", field.name)));
        }
        if !ENVELOPE_SLOTS.contains(&field.name.as_str()) {
            return Err(invalid(format!(
                "output '{}' is not one of: {}",
                field.name,
                ENVELOPE_SLOTS.join(", ")
            )));
        }
    }
    for slot in ["result", "working"] {
        if !spec.declares_output(slot) {
            return Err(invalid(format!("missing '{}' output", slot)));
        }
    }

    if let Some(selector) = &spec.unit_system {
        let source = spec.input(&selector.field).ok_or_else(|| {
            invalid(format!("unit system field '{}' is not an input", selector.field))
        })?;
        let options = source
            .allowed_values
            .as_ref()
            .filter(|_| source.field_type == FieldType::String)
            .ok_or_else(|| {
                invalid(format!(
                    "unit system field '{}' must be a string enum",
                    selector.field
                ))
            })?;
        for (system, units) in &selector.systems {
            if !options.contains(system) {
                return Err(invalid(format!(
                    "unit system '{}' is not an option of '{}'",
                    system, selector.field
                )));
            }
            for (field_name, unit) in units {
                let accepted = spec
                    .input(field_name)
                    .is_some_and(|f| f.field_type == FieldType::Number && f.accepts_unit(unit));
                if !accepted {
                    return Err(invalid(format!(
                        "unit system '{}' maps '{}' to '{}', which the field does not accept",
                        system, field_name, unit
                    )));
                }
            }
        }
    }

    Ok(())
}

fn check_input(field: &FieldSpec) -> Result<(), String> {
    let is_number = field.field_type == FieldType::Number;

    if !field.required && field.default.is_none() && !field.nullable {
        return Err(format!(
            "optional input '{}' needs a default or must be nullable",
            field.name
        ));
    }
    if !is_number && (field.min.is_some() || field.max.is_some()) {
        return Err(format!("bounds on non-numeric input '{}'", field.name));
    }
    if let (Some(min), Some(max)) = (field.min, field.max) {
        if min > max {
            return Err(format!("input '{}' has min {} above max {}", field.name, min, max));
        }
    }
    if field.allowed_values.is_some() && field.field_type != FieldType::String {
        return Err(format!("enum on non-string input '{}'", field.name));
    }
    if !field.allowed_units.is_empty() && field.unit.is_none() {
        return Err(format!(
            "input '{}' lists allowed units without a canonical unit",
            field.name
        ));
    }
    if field.unit.is_some() && !is_number {
        return Err(format!("unit on non-numeric input '{}'", field.name));
    }
    if let Some(default) = &field.default {
        check_default(field, default)?;
    }
    Ok(())
}

fn check_default(field: &FieldSpec, default: &Value) -> Result<(), String> {
    if !field.field_type.matches(default) {
        return Err(format!(
            "default for '{}' is not a {}",
            field.name, field.field_type
        ));
    }
    if let Some(n) = default.as_f64() {
        let below = field.min.is_some_and(|min| n < min);
        let above = field.max.is_some_and(|max| n > max);
        if below || above {
            return Err(format!("default for '{}' is out of range", field.name));
        }
    }
    if let (Some(allowed), Some(s)) = (&field.allowed_values, default.as_str()) {
        if !allowed.iter().any(|a| a == s) {
            return Err(format!("default for '{}' is not an allowed value", field.name));
        }
    }
    Ok(())
}

fn check_units(spec: &CalculatorSpec, converter: &UnitConverter) -> EngineResult<()> {
    for field in &spec.inputs {
        let Some(canonical) = field.unit.as_deref() else {
            continue;
        };
        for unit in &field.allowed_units {
            if !converter.supports(unit, canonical) {
                return Err(EngineError::InvalidSpec {
                    name: spec.name.clone(),
                    message: format!(
                        "input '{}' allows '{}' but no conversion to '{}' is registered",
                        field.name, unit, canonical
                    ),
                });
            }
        }
    }
    Ok(())
}

fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
