//! Raw calculator output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a calculation function returns before normalization.
///
/// Only `result` and `working` are mandatory; the normalizer fills the rest
/// from the calculator's declared output defaults.
///
/// # Example
///
/// ```
/// use clinical_calculators::models::CalculationResult;
/// use serde_json::json;
///
/// let result = CalculationResult::new(json!(22.86), json!("70 / 3.0625 = 22.86"))
///     .with_interpretation("Normal")
///     .with_tags(["bmi"]);
///
/// assert_eq!(result.interpretation.as_deref(), Some("Normal"));
/// assert_eq!(result.tags, vec!["bmi".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// The main result.
    pub result: Value,
    /// Explanation of how the result was obtained (string or object).
    pub working: Value,
    /// Clinical interpretation of the result.
    #[serde(default)]
    pub interpretation: Option<String>,
    /// Literature reference.
    #[serde(default)]
    pub reference: Option<String>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CalculationResult {
    /// Creates a result with the mandatory parts.
    pub fn new(result: Value, working: Value) -> Self {
        Self {
            result,
            working,
            interpretation: None,
            reference: None,
            tags: Vec::new(),
        }
    }

    /// Sets the interpretation.
    pub fn with_interpretation(mut self, interpretation: impl Into<String>) -> Self {
        self.interpretation = Some(interpretation.into());
        self
    }

    /// Sets the reference.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}
