//! Validated calculator parameters.
//!
//! [`ValidatedParameters`] can only be produced by the validation engine, so a
//! calculation function holding one knows every value has been type-checked,
//! range-checked and converted to its canonical unit.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{EngineError, EngineResult};

/// A typed parameter value in its canonical unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An object.
    Object(Map<String, Value>),
    /// An absent nullable field.
    Null,
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Number(_) => "number",
            ParamValue::String(_) => "string",
            ParamValue::Boolean(_) => "boolean",
            ParamValue::Object(_) => "object",
            ParamValue::Null => "null",
        }
    }
}

/// Parameters that passed validation for one dispatch call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedParameters {
    values: BTreeMap<String, ParamValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    supplied_units: BTreeMap<String, String>,
}

impl ValidatedParameters {
    pub(crate) fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            supplied_units: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &str, value: ParamValue) {
        self.values.insert(name.to_string(), value);
    }

    pub(crate) fn record_unit(&mut self, name: &str, unit: &str) {
        self.supplied_units.insert(name.to_string(), unit.to_string());
    }

    /// Returns the raw typed value of a parameter.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns a numeric parameter in its canonical unit.
    pub fn number(&self, name: &str) -> EngineResult<f64> {
        match self.lookup(name)? {
            ParamValue::Number(n) => Ok(*n),
            other => Err(mismatch(name, "number", other)),
        }
    }

    /// Returns a numeric parameter, or `None` when it is null.
    pub fn optional_number(&self, name: &str) -> EngineResult<Option<f64>> {
        match self.lookup(name)? {
            ParamValue::Number(n) => Ok(Some(*n)),
            ParamValue::Null => Ok(None),
            other => Err(mismatch(name, "number", other)),
        }
    }

    /// Returns a string parameter.
    pub fn string(&self, name: &str) -> EngineResult<&str> {
        match self.lookup(name)? {
            ParamValue::String(s) => Ok(s),
            other => Err(mismatch(name, "string", other)),
        }
    }

    /// Returns a boolean parameter.
    pub fn boolean(&self, name: &str) -> EngineResult<bool> {
        match self.lookup(name)? {
            ParamValue::Boolean(b) => Ok(*b),
            other => Err(mismatch(name, "boolean", other)),
        }
    }

    /// Returns an object parameter.
    pub fn object(&self, name: &str) -> EngineResult<&Map<String, Value>> {
        match self.lookup(name)? {
            ParamValue::Object(map) => Ok(map),
            other => Err(mismatch(name, "object", other)),
        }
    }

    /// Returns the unit a numeric parameter was supplied in, before conversion.
    pub fn supplied_unit(&self, name: &str) -> Option<&str> {
        self.supplied_units.get(name).map(String::as_str)
    }

    /// Iterates over parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn lookup(&self, name: &str) -> EngineResult<&ParamValue> {
        self.values.get(name).ok_or_else(|| EngineError::InvalidParameter {
            name: name.to_string(),
            message: "parameter is not declared by the calculator".to_string(),
        })
    }
}

fn mismatch(name: &str, expected: &str, actual: &ParamValue) -> EngineError {
    EngineError::InvalidParameter {
        name: name.to_string(),
        message: format!("expected {}, found {}", expected, actual.type_name()),
    }
}
