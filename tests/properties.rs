//! Property tests for validation, unit conversion and dispatch.

use proptest::prelude::*;
use serde_json::{Map, Value, json};

use clinical_calculators::engine::{KG_PER_LB, UnitConverter, validate};
use clinical_calculators::error::EngineError;
use clinical_calculators::models::{CalculatorSpec, FieldSpec, FieldType, ViolationKind};

const UNIT_PAIRS: &[(&str, &str)] = &[
    ("lb", "kg"),
    ("g", "kg"),
    ("oz", "lb"),
    ("in", "m"),
    ("ft", "cm"),
    ("degF", "degC"),
];

fn bounded_spec(min: f64, max: f64) -> CalculatorSpec {
    CalculatorSpec::new("bounded", "1.0").with_input(
        FieldSpec::new("x", FieldType::Number)
            .required()
            .with_unit("kg")
            .with_allowed_units(["lb"])
            .with_bounds(Some(min), Some(max)),
    )
}

fn wide_spec(fields: usize) -> CalculatorSpec {
    (0..fields).fold(CalculatorSpec::new("wide", "1.0"), |spec, i| {
        spec.with_input(FieldSpec::new(format!("f{}", i), FieldType::Number).required())
    })
}

fn violations(result: Result<impl std::fmt::Debug, EngineError>) -> Vec<ViolationKind> {
    match result {
        Err(EngineError::ValidationError { violations }) => {
            violations.into_iter().map(|v| v.kind).collect()
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

proptest! {
    #[test]
    fn prop_unit_round_trip(index in 0..UNIT_PAIRS.len(), value in -1.0e6f64..1.0e6) {
        let converter = UnitConverter::with_defaults();
        let (from, to) = UNIT_PAIRS[index];

        let there = converter.convert(value, from, to).unwrap();
        let back = converter.convert(there, to, from).unwrap();

        let tolerance = 1e-9 * value.abs().max(1.0);
        prop_assert!((back - value).abs() <= tolerance, "{} -> {} -> {}", value, there, back);
    }

    #[test]
    fn prop_values_inside_bounds_accepted(
        min in -1000.0f64..1000.0,
        span in 0.0f64..1000.0,
        t in 0.0f64..=1.0,
    ) {
        let max = min + span;
        let spec = bounded_spec(min, max);
        let converter = UnitConverter::with_defaults();

        for value in [min, max, min + span * t] {
            let value = value.clamp(min, max);
            let params = validate(&spec, &json!({"x": value}), &converter, &[]).unwrap();
            prop_assert_eq!(params.number("x").unwrap(), value);
        }
    }

    #[test]
    fn prop_values_outside_bounds_rejected(
        min in -1000.0f64..1000.0,
        span in 0.0f64..1000.0,
        excess in 1.0e-3f64..1000.0,
    ) {
        let max = min + span;
        let spec = bounded_spec(min, max);
        let converter = UnitConverter::with_defaults();

        for value in [min - excess, max + excess] {
            let kinds = violations(validate(&spec, &json!({"x": value}), &converter, &[]));
            prop_assert_eq!(kinds, vec![ViolationKind::OutOfRange]);
        }
    }

    #[test]
    fn prop_converted_value_matches_factor(pounds in 0.0f64..1000.0) {
        let spec = bounded_spec(0.0, 1000.0);
        let converter = UnitConverter::with_defaults();

        let params = validate(&spec, &json!({"x": {"value": pounds, "unit": "lb"}}), &converter, &[]).unwrap();
        let kg = params.number("x").unwrap();
        prop_assert!((kg - pounds * KG_PER_LB).abs() < 1e-9);
        prop_assert_eq!(params.supplied_unit("x"), Some("lb"));
    }

    #[test]
    fn prop_violations_accumulate(present in proptest::collection::vec(any::<bool>(), 1..12)) {
        let spec = wide_spec(present.len());
        let mut raw = Map::new();
        for (i, keep) in present.iter().enumerate() {
            if *keep {
                raw.insert(format!("f{}", i), json!(i));
            }
        }
        let missing = present.iter().filter(|keep| !**keep).count();

        let result = validate(&spec, &Value::Object(raw), &UnitConverter::new(), &[]);
        if missing == 0 {
            prop_assert!(result.is_ok());
        } else {
            let kinds = violations(result);
            prop_assert_eq!(kinds.len(), missing);
            prop_assert!(kinds.iter().all(|k| *k == ViolationKind::MissingField));
        }
    }

    #[test]
    fn prop_unknown_names_not_found(name in "[a-z_]{1,24}") {
        prop_assume!(name != "bmi" && name != "dcct_ifcc");

        match clinical_calculators::dispatch(&name, &json!({})) {
            Err(EngineError::CalculatorNotFound { name: missing }) => prop_assert_eq!(missing, name),
            other => prop_assert!(false, "Expected CalculatorNotFound, got {:?}", other),
        }
    }
}
