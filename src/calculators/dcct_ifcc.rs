//! HbA1c conversion between DCCT/NGSP (%) and IFCC (mmol/mol).

use rust_decimal::Decimal;
use serde_json::json;

use crate::config::ConfigLoader;
use crate::engine::RegistryEntry;
use crate::error::{EngineError, EngineResult};
use crate::models::{CalculationResult, ValidatedParameters, Violation, ViolationKind};

use super::{decimal, display, number, round2};

const SPEC_YAML: &str = include_str!("../../specs/dcct_ifcc.yaml");

/// Highest plausible DCCT percentage.
pub const MAX_DCCT_PERCENT: f64 = 20.0;

const REFERENCE: &str = "NGSP/IFCC 2023 Guidelines";
const TAGS: [&str; 4] = ["dcct", "ifcc", "hba1c", "conversion"];

fn offset() -> Decimal {
    Decimal::new(215, 2)
}

fn slope() -> Decimal {
    Decimal::new(10929, 3)
}

/// Builds the registry entry.
pub fn entry() -> EngineResult<RegistryEntry> {
    let spec = ConfigLoader::spec_from_yaml("specs/dcct_ifcc.yaml", SPEC_YAML)?;
    Ok(RegistryEntry::new(spec, calculate)
        .with_cross_field_rule(positive_value)
        .with_cross_field_rule(dcct_ceiling))
}

/// Glycaemic class of an IFCC value (mmol/mol).
pub fn classify_ifcc(ifcc: f64) -> &'static str {
    if ifcc < 42.0 {
        "Normal"
    } else if ifcc < 48.0 {
        "Prediabetes"
    } else {
        "Diabetes"
    }
}

/// Glycaemic class of a DCCT value (%).
pub fn classify_dcct(dcct: f64) -> &'static str {
    if dcct <= 6.0 {
        "Normal"
    } else if dcct < 6.5 {
        "Prediabetes"
    } else {
        "Diabetes"
    }
}

/// Converts `value` from `input_unit` to the other unit.
pub fn calculate(params: &ValidatedParameters) -> EngineResult<CalculationResult> {
    let raw = params.number("value")?;
    let value = decimal("value", raw)?;

    let (converted, formula, calculation, interpretation) = match params.string("input_unit")? {
        "dcct" => {
            let ifcc = round2((value - offset()) * slope());
            let class = classify_ifcc(number("result", ifcc)?.as_f64().unwrap_or_default());
            (
                ifcc,
                "IFCC = (DCCT - 2.15) × 10.929",
                format!("({} - 2.15) × 10.929 = {} mmol/mol", display(value), display(ifcc)),
                format!("{}% DCCT = {} mmol/mol IFCC: {}", display(value), display(ifcc), class),
            )
        }
        "ifcc" => {
            let quotient = value
                .checked_div(slope())
                .ok_or_else(|| EngineError::InvalidParameter {
                    name: "value".to_string(),
                    message: "value cannot be divided by the IFCC slope".to_string(),
                })?;
            let dcct = round2(quotient + offset());
            let class = classify_dcct(number("result", dcct)?.as_f64().unwrap_or_default());
            (
                dcct,
                "DCCT = (IFCC / 10.929) + 2.15",
                format!("({} / 10.929) + 2.15 = {}%", display(value), display(dcct)),
                format!("{} mmol/mol IFCC = {}% DCCT: {}", display(value), display(dcct), class),
            )
        }
        other => {
            return Err(EngineError::InvalidParameter {
                name: "input_unit".to_string(),
                message: format!("unknown unit '{}'", other),
            });
        }
    };

    Ok(CalculationResult::new(
        number("result", converted)?,
        json!({"formula": formula, "calculation": calculation}),
    )
    .with_interpretation(interpretation)
    .with_reference(REFERENCE)
    .with_tags(TAGS))
}

fn positive_value(params: &ValidatedParameters) -> Vec<Violation> {
    match params.number("value") {
        Ok(v) if v <= 0.0 => vec![Violation::new(
            "value",
            ViolationKind::CrossField,
            "value must be > 0",
        )],
        _ => Vec::new(),
    }
}

fn dcct_ceiling(params: &ValidatedParameters) -> Vec<Violation> {
    match (params.string("input_unit"), params.number("value")) {
        (Ok("dcct"), Ok(v)) if v > MAX_DCCT_PERCENT => vec![Violation::new(
            "value",
            ViolationKind::CrossField,
            "DCCT value must be ≤ 20%",
        )],
        _ => Vec::new(),
    }
}
