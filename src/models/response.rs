//! The response envelope returned on every surface.
//!
//! [`CalculationResponse`] is the only shape a caller ever sees. Its keys are
//! fixed by the type: `result`, `working`, `interpretation`, `reference` and
//! `metadata` are always serialized (as `null` when empty), and `tags` is
//! serialized exactly when the calculator declares a `tags` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Optional caller context copied into response metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Preferred language of the caller (e.g. "en").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Free-form client identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// Generated metadata attached to every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// When the response was produced (UTC).
    pub timestamp: DateTime<Utc>,
    /// The calculator's spec version.
    pub version: String,
    /// The calculator's name.
    pub calculator_name: String,
    /// Caller language, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Caller client identifier, when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// The standard calculation envelope.
///
/// # Example
///
/// ```
/// use clinical_calculators::models::{CalculationResponse, ResponseMetadata};
/// use chrono::Utc;
/// use serde_json::json;
///
/// let response = CalculationResponse {
///     result: json!(22.86),
///     working: json!("70 / 3.0625 = 22.86"),
///     interpretation: None,
///     reference: None,
///     metadata: ResponseMetadata {
///         timestamp: Utc::now(),
///         version: "1.0".to_string(),
///         calculator_name: "bmi".to_string(),
///         language: None,
///         client: None,
///     },
///     tags: None,
/// };
///
/// let json = serde_json::to_value(&response).unwrap();
/// assert!(json["interpretation"].is_null());
/// assert!(json.get("tags").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResponse {
    /// The main result.
    pub result: Value,
    /// How the result was obtained.
    pub working: Value,
    /// Clinical interpretation.
    pub interpretation: Option<String>,
    /// Literature reference.
    pub reference: Option<String>,
    /// Generated metadata.
    pub metadata: ResponseMetadata,
    /// Tags, present when the calculator declares them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(tags: Option<Vec<String>>) -> CalculationResponse {
        CalculationResponse {
            result: json!(53.01),
            working: json!({"formula": "IFCC = (DCCT - 2.15) × 10.929"}),
            interpretation: Some("Diabetes".to_string()),
            reference: None,
            metadata: ResponseMetadata {
                timestamp: Utc::now(),
                version: "1.0".to_string(),
                calculator_name: "dcct_ifcc".to_string(),
                language: None,
                client: None,
            },
            tags,
        }
    }

    #[test]
    fn test_null_slots_are_serialized_not_omitted() {
        let json = serde_json::to_value(sample(None)).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("reference"));
        assert!(object["reference"].is_null());
        assert!(!object.contains_key("tags"));
    }

    #[test]
    fn test_tags_serialized_when_present() {
        let json = serde_json::to_value(sample(Some(vec!["hba1c".to_string()]))).unwrap();
        assert_eq!(json["tags"], json!(["hba1c"]));
    }

    #[test]
    fn test_metadata_timestamp_is_utc_rfc3339() {
        let json = serde_json::to_value(sample(None)).unwrap();
        let timestamp = json["metadata"]["timestamp"].as_str().unwrap();
        assert!(timestamp.ends_with('Z'), "expected UTC timestamp, got {}", timestamp);
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_context_fields_skipped_when_absent() {
        let json = serde_json::to_value(sample(None)).unwrap();
        let metadata = json["metadata"].as_object().unwrap();
        assert!(!metadata.contains_key("language"));
        assert!(!metadata.contains_key("client"));
        assert_eq!(metadata["calculator_name"], "dcct_ifcc");
    }
}
