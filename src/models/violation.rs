//! Validation diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of rule a parameter broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required field was absent.
    MissingField,
    /// The value had the wrong JSON type.
    TypeMismatch,
    /// The value was supplied in a unit the field cannot convert from.
    UnsupportedUnit,
    /// The value fell outside the inclusive bounds.
    OutOfRange,
    /// The value was not one of the allowed strings.
    InvalidEnumValue,
    /// A calculator-supplied rule spanning several fields failed.
    CrossField,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::MissingField => "missing_field",
            ViolationKind::TypeMismatch => "type_mismatch",
            ViolationKind::UnsupportedUnit => "unsupported_unit",
            ViolationKind::OutOfRange => "out_of_range",
            ViolationKind::InvalidEnumValue => "invalid_enum_value",
            ViolationKind::CrossField => "cross_field",
        };
        f.write_str(name)
    }
}

/// One problem with one input field.
///
/// # Example
///
/// ```
/// use clinical_calculators::models::{Violation, ViolationKind};
///
/// let violation = Violation::new("weight", ViolationKind::MissingField, "required field is missing");
/// assert_eq!(violation.to_string(), "weight: missing_field (required field is missing)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The field the violation concerns.
    pub field: String,
    /// What kind of rule was broken.
    pub kind: ViolationKind,
    /// Human-readable diagnostic.
    pub detail: String,
}

impl Violation {
    /// Creates a violation.
    pub fn new(field: impl Into<String>, kind: ViolationKind, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.kind, self.detail)
    }
}
