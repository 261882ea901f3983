//! Body Mass Index.
//!
//! BMI = weight (kg) / height (m)², rounded to 2 decimals and classified with
//! the WHO adult thresholds. Imperial inputs reach the calculation already
//! converted to kg and m.

use serde_json::Value;

use crate::config::ConfigLoader;
use crate::engine::RegistryEntry;
use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationResult, ValidatedParameters, Violation, ViolationKind};

use super::{decimal, display, number, round2};

const SPEC_YAML: &str = include_str!("../../specs/bmi.yaml");

/// Builds the registry entry.
pub fn entry() -> EngineResult<RegistryEntry> {
    let spec = ConfigLoader::spec_from_yaml("specs/bmi.yaml", SPEC_YAML)?;
    Ok(RegistryEntry::new(spec, calculate)
        .with_cross_field_rule(positive_measurements)
        .with_cross_field_rule(units_match_system))
}

/// WHO adult BMI classification.
pub fn classify(bmi: f64) -> &'static str {
    if bmi < 18.5 {
        "Underweight"
    } else if bmi < 25.0 {
        "Normal"
    } else if bmi < 30.0 {
        "Overweight"
    } else {
        "Obese"
    }
}

/// Calculates BMI from validated weight (kg) and height (m).
pub fn calculate(params: &ValidatedParameters) -> EngineResult<CalculationResult> {
    let weight = decimal("weight", params.number("weight")?)?;
    let height = decimal("height", params.number("height")?)?;

    // Heights near zero square to zero or overflow the quotient in decimal.
    let Some((height_squared, raw)) = height
        .checked_mul(height)
        .filter(|squared| !squared.is_zero())
        .and_then(|squared| Some((squared, weight.checked_div(squared)?)))
    else {
        return Err(EngineError::InvalidParameter {
            name: "height".to_string(),
            message: format!("BMI is not representable for a height of {} m", height),
        });
    };
    let bmi = round2(raw);
    let result = number("bmi", bmi)?;
    let bmi_value = result.as_f64().unwrap_or_default();

    let weight_shown = round2(weight).normalize();
    let height_shown = height.round_dp(4).normalize();
    let mut working = format!(
        "BMI = {} kg / ({} m)² = {} / {} = {}",
        weight_shown,
        height_shown,
        weight_shown,
        height_squared.round_dp(4).normalize(),
        display(bmi)
    );
    if let Some(converted) = converted_note(params) {
        working = format!("{}; {}", converted, working);
    }

    Ok(CalculationResult::new(result, Value::String(working)).with_interpretation(classify(bmi_value)))
}

fn converted_note(params: &ValidatedParameters) -> Option<String> {
    let notes: Vec<String> = [("weight", "kg"), ("height", "m")]
        .into_iter()
        .filter_map(|(field, canonical)| {
            let unit = params.supplied_unit(field)?;
            (unit != canonical).then(|| format!("{} converted from {}", field, unit))
        })
        .collect();
    (!notes.is_empty()).then(|| notes.join(", "))
}

/// Weight and height must be strictly positive.
fn positive_measurements(params: &ValidatedParameters) -> Vec<Violation> {
    ["weight", "height"]
        .into_iter()
        .filter(|field| params.number(field).is_ok_and(|v| v <= 0.0))
        .map(|field| {
            Violation::new(field, ViolationKind::CrossField, format!("{} must be > 0", field))
        })
        .collect()
}

/// Tagged units must agree with the selected unit system.
fn units_match_system(params: &ValidatedParameters) -> Vec<Violation> {
    let Ok(system) = params.string("unit_system") else {
        return Vec::new();
    };
    let expected: &[(&str, &str)] = match system {
        "metric" => &[("weight", "kg"), ("height", "m")],
        "imperial" => &[("weight", "lb"), ("height", "in")],
        _ => return Vec::new(),
    };

    expected
        .iter()
        .filter_map(|(field, unit)| {
            let supplied = params.supplied_unit(field)?;
            (supplied != *unit).then(|| {
                Violation::new(
                    *field,
                    ViolationKind::CrossField,
                    format!(
                        "{} given in '{}' but unit_system '{}' expects '{}'",
                        field, supplied, system, unit
                    ),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{UnitConverter, validate};
    use serde_json::json;

    fn run(raw: Value) -> EngineResult<CalculationResult> {
        let entry = entry().unwrap();
        let params = validate(
            &entry.spec,
            &raw,
            &UnitConverter::with_defaults(),
            &entry.cross_field_rules,
        )?;
        calculate(&params)
    }

    #[test]
    fn test_sidecar_parses() {
        let entry = entry().unwrap();
        assert_eq!(entry.spec.name, "bmi");
        assert_eq!(entry.spec.inputs.len(), 3);
        assert!(entry.spec.unit_system.is_some());
        assert_eq!(
            entry.spec.output("reference").and_then(|f| f.default.clone()),
            Some(json!("WHO 2023 Guidelines"))
        );
    }

    #[test]
    fn test_metric_normal() {
        let result = run(json!({"weight": 70, "height": 1.75, "unit_system": "metric"})).unwrap();

        assert_eq!(result.result, json!(22.86));
        assert_eq!(result.interpretation.as_deref(), Some("Normal"));
        let working = result.working.as_str().unwrap();
        assert!(working.contains("3.0625"), "working: {}", working);
        assert!(working.ends_with("= 22.86"));
    }

    #[test]
    fn test_imperial_matches_metric() {
        let result = run(json!({"weight": 154.324, "height": 68.8976, "unit_system": "imperial"})).unwrap();

        assert!((result.result.as_f64().unwrap() - 22.86).abs() < 0.02);
        let working = result.working.as_str().unwrap();
        assert!(working.starts_with("weight converted from lb, height converted from in"));
    }

    #[test]
    fn test_imperial_height_out_of_range() {
        let err = run(json!({"weight": 150, "height": 200, "unit_system": "imperial"})).unwrap_err();
        let violations = err.violations().unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "height");
        assert_eq!(violations[0].kind, ViolationKind::OutOfRange);
    }

    #[test]
    fn test_zero_weight_fails_cross_field_rule() {
        let err = run(json!({"weight": 0, "height": 1.75, "unit_system": "metric"})).unwrap_err();
        let violations = err.violations().unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::CrossField);
        assert_eq!(violations[0].detail, "weight must be > 0");
    }

    #[test]
    fn test_tagged_unit_must_match_system() {
        let err = run(json!({
            "weight": {"value": 154, "unit": "lb"},
            "height": 1.75,
            "unit_system": "metric"
        }))
        .unwrap_err();
        let violations = err.violations().unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "weight");
        assert!(violations[0].detail.contains("expects 'kg'"));
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(classify(18.49), "Underweight");
        assert_eq!(classify(18.5), "Normal");
        assert_eq!(classify(24.99), "Normal");
        assert_eq!(classify(25.0), "Overweight");
        assert_eq!(classify(30.0), "Obese");
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let result = run(json!({"weight": 22.505, "height": 1.0, "unit_system": "metric"})).unwrap();
        assert_eq!(result.result, json!(22.51));
    }

    #[test]
    fn test_vanishing_height_reports_unrepresentable_bmi() {
        for height in [1e-14, 1e-20] {
            let err = run(json!({"weight": 70, "height": height, "unit_system": "metric"})).unwrap_err();
            match err {
                EngineError::InvalidParameter { name, message } => {
                    assert_eq!(name, "height");
                    assert!(message.starts_with("BMI is not representable"), "message: {}", message);
                }
                other => panic!("Expected InvalidParameter, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_vanishing_height_is_calculation_failure_when_dispatched() {
        let err = crate::dispatch("bmi", &json!({"weight": 70, "height": 1e-20, "unit_system": "metric"}))
            .unwrap_err();
        match err {
            EngineError::CalculationFailed { name, cause } => {
                assert_eq!(name, "bmi");
                assert!(cause.contains("not representable"), "cause: {}", cause);
                assert!(!cause.contains("non-zero"));
            }
            other => panic!("Expected CalculationFailed, got {:?}", other),
        }
    }
}
