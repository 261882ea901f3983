//! Declarative calculator schemas.
//!
//! A [`CalculatorSpec`] describes what a calculator accepts and produces.
//! Specs carry no behaviour: the validation engine reads them, the registry
//! checks them once at startup, and the normalizer uses the declared outputs
//! to shape the response envelope.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON type a field's value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// A JSON number.
    Number,
    /// A JSON string.
    String,
    /// A JSON boolean.
    Boolean,
    /// A JSON object.
    Object,
}

impl FieldType {
    /// Returns true if `value` has this type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::Number => value.is_number(),
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
        };
        f.write_str(name)
    }
}

/// One input or output field of a calculator.
///
/// # Example
///
/// ```
/// use clinical_calculators::models::{FieldSpec, FieldType};
///
/// let weight = FieldSpec::new("weight", FieldType::Number)
///     .required()
///     .with_unit("kg")
///     .with_allowed_units(["lb"])
///     .with_bounds(Some(0.0), Some(500.0));
///
/// assert!(weight.required);
/// assert_eq!(weight.unit.as_deref(), Some("kg"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name, unique within its calculator.
    pub name: String,
    /// The JSON type of the value.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the caller must supply the field.
    #[serde(default)]
    pub required: bool,
    /// Canonical unit code the value is normalized to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Alternative unit codes convertible to the canonical unit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_units: Vec<String>,
    /// Inclusive lower bound, in the canonical unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound, in the canonical unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Closed set of allowed string values.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    /// Value used when the field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether the field may be null.
    #[serde(default)]
    pub nullable: bool,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl FieldSpec {
    /// Creates an optional field of the given type with no constraints.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            unit: None,
            allowed_units: Vec::new(),
            min: None,
            max: None,
            allowed_values: None,
            default: None,
            nullable: false,
            description: String::new(),
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the canonical unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the alternative units.
    pub fn with_allowed_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_units = units.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the inclusive bounds.
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Restricts the field to a closed set of strings.
    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns true if `unit` is the canonical unit or one of the alternatives.
    pub fn accepts_unit(&self, unit: &str) -> bool {
        self.unit.as_deref() == Some(unit) || self.allowed_units.iter().any(|u| u == unit)
    }
}

/// Selects the units of numeric inputs from an enumerated input.
///
/// For example a `unit_system` field with `metric` and `imperial` options
/// can imply `kg`/`m` or `lb`/`in` for bare numbers supplied to `weight` and
/// `height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSystemSelector {
    /// The string enum input holding the selected system.
    pub field: String,
    /// Option name → (field name → unit code).
    pub systems: BTreeMap<String, BTreeMap<String, String>>,
}

impl UnitSystemSelector {
    /// Returns the unit implied for `field` when `system` is selected.
    pub fn implied_unit(&self, system: &str, field: &str) -> Option<&str> {
        self.systems
            .get(system)
            .and_then(|units| units.get(field))
            .map(String::as_str)
    }
}

/// The declarative description of one calculator.
///
/// Loaded once at startup and never mutated afterwards. The `name` is the
/// identifier used by every surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorSpec {
    /// Globally unique calculator name.
    pub name: String,
    /// Grouping used in listings.
    #[serde(default)]
    pub category: String,
    /// One-line summary of what the calculator does.
    #[serde(default)]
    pub purpose: String,
    /// Inputs, in validation order.
    #[serde(default)]
    pub inputs: Vec<FieldSpec>,
    /// Outputs, drawn from the envelope slots.
    #[serde(default)]
    pub outputs: Vec<FieldSpec>,
    /// Version reported in response metadata.
    pub version: String,
    /// Literature reference for the calculator as a whole.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Optional unit-system selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_system: Option<UnitSystemSelector>,
}

impl CalculatorSpec {
    /// Creates an empty spec with the given name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            purpose: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            version: version.into(),
            reference: None,
            notes: None,
            unit_system: None,
        }
    }

    /// Appends an input field.
    pub fn with_input(mut self, field: FieldSpec) -> Self {
        self.inputs.push(field);
        self
    }

    /// Appends an output field.
    pub fn with_output(mut self, field: FieldSpec) -> Self {
        self.outputs.push(field);
        self
    }

    /// Sets the category and purpose.
    pub fn with_summary(mut self, category: impl Into<String>, purpose: impl Into<String>) -> Self {
        self.category = category.into();
        self.purpose = purpose.into();
        self
    }

    /// Sets the unit-system selector.
    pub fn with_unit_system(mut self, selector: UnitSystemSelector) -> Self {
        self.unit_system = Some(selector);
        self
    }

    /// Looks up an input by name.
    pub fn input(&self, name: &str) -> Option<&FieldSpec> {
        self.inputs.iter().find(|f| f.name == name)
    }

    /// Looks up an output by name.
    pub fn output(&self, name: &str) -> Option<&FieldSpec> {
        self.outputs.iter().find(|f| f.name == name)
    }

    /// Returns true if the spec declares an output with this name.
    pub fn declares_output(&self, name: &str) -> bool {
        self.output(name).is_some()
    }
}

/// The listing view of a spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorSummary {
    /// Calculator name.
    pub name: String,
    /// Category.
    pub category: String,
    /// Purpose.
    pub purpose: String,
    /// Version.
    pub version: String,
}

impl From<&CalculatorSpec> for CalculatorSummary {
    fn from(spec: &CalculatorSpec) -> Self {
        Self {
            name: spec.name.clone(),
            category: spec.category.clone(),
            purpose: spec.purpose.clone(),
            version: spec.version.clone(),
        }
    }
}
