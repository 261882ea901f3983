//! Parameter validation.
//!
//! This module checks a raw JSON parameter mapping against a calculator's
//! declared inputs. Fields are checked in declaration order and violations
//! accumulate: the caller receives every problem in one pass. Cross-field
//! rules run only once every single-field check has passed.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculatorSpec, FieldSpec, FieldType, ParamValue, ValidatedParameters, Violation, ViolationKind,
};

use super::units::UnitConverter;

/// A calculator-supplied rule evaluated over fully validated parameters.
///
/// Returns the violations it finds; an empty vector means the rule passed.
pub type CrossFieldRule = fn(&ValidatedParameters) -> Vec<Violation>;

/// Validates raw parameters against a calculator spec.
///
/// `null` is treated as an empty mapping. Unknown keys are ignored.
///
/// # Returns
///
/// Returns the validated parameters, every number in its canonical unit, or
/// `ValidationError` carrying all violations in field order followed by any
/// cross-field violations.
///
/// # Example
///
/// ```
/// use clinical_calculators::engine::{validate, UnitConverter};
/// use clinical_calculators::models::{CalculatorSpec, FieldSpec, FieldType};
/// use serde_json::json;
///
/// let spec = CalculatorSpec::new("demo", "1.0").with_input(
///     FieldSpec::new("weight", FieldType::Number)
///         .required()
///         .with_unit("kg")
///         .with_allowed_units(["lb"])
///         .with_bounds(Some(0.0), Some(500.0)),
/// );
/// let converter = UnitConverter::with_defaults();
///
/// let params = validate(&spec, &json!({"weight": {"value": 10, "unit": "lb"}}), &converter, &[]).unwrap();
/// assert!((params.number("weight").unwrap() - 4.5359237).abs() < 1e-9);
/// assert_eq!(params.supplied_unit("weight"), Some("lb"));
/// ```
pub fn validate(
    spec: &CalculatorSpec,
    raw: &Value,
    converter: &UnitConverter,
    rules: &[CrossFieldRule],
) -> EngineResult<ValidatedParameters> {
    let empty = Map::new();
    let raw = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(EngineError::ValidationError {
                violations: vec![Violation::new(
                    "params",
                    ViolationKind::TypeMismatch,
                    format!("expected an object of parameters, got {}", json_type(other)),
                )],
            });
        }
    };

    let system = selected_system(spec, raw);
    let mut params = ValidatedParameters::new();
    let mut violations = Vec::new();

    for field in &spec.inputs {
        match raw.get(&field.name).filter(|v| !v.is_null()) {
            None if field.required => violations.push(Violation::new(
                &field.name,
                ViolationKind::MissingField,
                "required field is missing",
            )),
            None => {
                let value = field.default.as_ref().map_or(ParamValue::Null, to_param);
                params.insert(&field.name, value);
            }
            Some(value) => match check_field(spec, field, value, system, converter) {
                Ok(checked) => {
                    if let Some(unit) = &checked.unit {
                        params.record_unit(&field.name, unit);
                    }
                    params.insert(&field.name, checked.value);
                }
                Err(violation) => violations.push(violation),
            },
        }
    }

    if violations.is_empty() {
        for rule in rules {
            violations.extend(rule(&params));
        }
    }

    if violations.is_empty() {
        Ok(params)
    } else {
        debug!(
            calculator = %spec.name,
            violations = violations.len(),
            "Parameter validation failed"
        );
        Err(EngineError::ValidationError { violations })
    }
}

struct CheckedField {
    value: ParamValue,
    unit: Option<String>,
}

fn check_field(
    spec: &CalculatorSpec,
    field: &FieldSpec,
    value: &Value,
    system: Option<&str>,
    converter: &UnitConverter,
) -> Result<CheckedField, Violation> {
    match field.field_type {
        FieldType::Number => check_number(spec, field, value, system, converter),
        FieldType::String => {
            let text = value
                .as_str()
                .ok_or_else(|| type_mismatch(field, value))?;
            if let Some(allowed) = &field.allowed_values {
                if !allowed.iter().any(|a| a == text) {
                    return Err(Violation::new(
                        &field.name,
                        ViolationKind::InvalidEnumValue,
                        format!("'{}' is not one of: {}", text, allowed.join(", ")),
                    ));
                }
            }
            Ok(CheckedField {
                value: ParamValue::String(text.to_string()),
                unit: None,
            })
        }
        FieldType::Boolean => {
            let flag = value
                .as_bool()
                .ok_or_else(|| type_mismatch(field, value))?;
            Ok(CheckedField {
                value: ParamValue::Boolean(flag),
                unit: None,
            })
        }
        FieldType::Object => {
            let map = value
                .as_object()
                .ok_or_else(|| type_mismatch(field, value))?;
            Ok(CheckedField {
                value: ParamValue::Object(map.clone()),
                unit: None,
            })
        }
    }
}

fn check_number(
    spec: &CalculatorSpec,
    field: &FieldSpec,
    value: &Value,
    system: Option<&str>,
    converter: &UnitConverter,
) -> Result<CheckedField, Violation> {
    let (number, explicit_unit) = read_number(value).ok_or_else(|| type_mismatch(field, value))?;

    let implied_unit = system.and_then(|s| {
        spec.unit_system
            .as_ref()
            .and_then(|selector| selector.implied_unit(s, &field.name))
    });
    let supplied_unit = explicit_unit.or(implied_unit);
    let canonical_unit = field.unit.as_deref();

    let canonical = match (supplied_unit, canonical_unit) {
        (None, _) => number,
        (Some(supplied), Some(canonical)) if supplied == canonical => number,
        (Some(supplied), Some(canonical)) => {
            if !field.allowed_units.iter().any(|u| u == supplied) {
                return Err(Violation::new(
                    &field.name,
                    ViolationKind::UnsupportedUnit,
                    format!(
                        "unit '{}' is not accepted (expected {})",
                        supplied,
                        accepted_units(field)
                    ),
                ));
            }
            converter
                .convert(number, supplied, canonical)
                .map_err(|err| {
                    Violation::new(&field.name, ViolationKind::UnsupportedUnit, err.to_string())
                })?
        }
        (Some(supplied), None) => {
            return Err(Violation::new(
                &field.name,
                ViolationKind::UnsupportedUnit,
                format!("field takes no unit, got '{}'", supplied),
            ));
        }
    };

    let shown = describe_value(number, supplied_unit, canonical, canonical_unit);
    let suffix = canonical_unit.map(|u| format!(" {}", u)).unwrap_or_default();

    if !canonical.is_finite() {
        return Err(Violation::new(
            &field.name,
            ViolationKind::OutOfRange,
            format!("{} = {} is not a finite number", field.name, shown),
        ));
    }
    if let Some(min) = field.min {
        if canonical < min {
            return Err(Violation::new(
                &field.name,
                ViolationKind::OutOfRange,
                format!("{} = {} is below the minimum of {}{}", field.name, shown, min, suffix),
            ));
        }
    }
    if let Some(max) = field.max {
        if canonical > max {
            return Err(Violation::new(
                &field.name,
                ViolationKind::OutOfRange,
                format!("{} = {} exceeds the maximum of {}{}", field.name, shown, max, suffix),
            ));
        }
    }

    Ok(CheckedField {
        value: ParamValue::Number(canonical),
        unit: supplied_unit.or(canonical_unit).map(str::to_string),
    })
}

/// Reads a bare number or the tagged form `{"value": n, "unit": "code"}`.
fn read_number(value: &Value) -> Option<(f64, Option<&str>)> {
    match value {
        Value::Number(n) => n.as_f64().map(|n| (n, None)),
        Value::Object(map) if map.len() == 2 => {
            let number = map.get("value")?.as_f64()?;
            let unit = map.get("unit")?.as_str()?;
            Some((number, Some(unit)))
        }
        _ => None,
    }
}

fn describe_value(
    number: f64,
    supplied_unit: Option<&str>,
    canonical: f64,
    canonical_unit: Option<&str>,
) -> String {
    match (supplied_unit, canonical_unit) {
        (Some(supplied), Some(unit)) if supplied != unit => {
            format!("{} {} ({} {})", number, supplied, canonical, unit)
        }
        (_, Some(unit)) => format!("{} {}", number, unit),
        _ => number.to_string(),
    }
}

fn accepted_units(field: &FieldSpec) -> String {
    field
        .unit
        .iter()
        .chain(field.allowed_units.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn selected_system<'a>(spec: &CalculatorSpec, raw: &'a Map<String, Value>) -> Option<&'a str> {
    let selector = spec.unit_system.as_ref()?;
    raw.get(&selector.field)
        .and_then(Value::as_str)
        .filter(|system| selector.systems.contains_key(*system))
}

fn type_mismatch(field: &FieldSpec, value: &Value) -> Violation {
    let expected = match field.field_type {
        FieldType::Number if field.unit.is_some() => {
            "number or {\"value\": number, \"unit\": string}".to_string()
        }
        other => other.to_string(),
    };
    Violation::new(
        &field.name,
        ViolationKind::TypeMismatch,
        format!("expected {}, got {}", expected, json_type(value)),
    )
}

fn to_param(value: &Value) -> ParamValue {
    match value {
        Value::Number(n) => n.as_f64().map_or(ParamValue::Null, ParamValue::Number),
        Value::String(s) => ParamValue::String(s.clone()),
        Value::Bool(b) => ParamValue::Boolean(*b),
        Value::Object(map) => ParamValue::Object(map.clone()),
        Value::Null | Value::Array(_) => ParamValue::Null,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
