//! Coding and CodeableConcept types
//!
//! Minimal renditions of the two FHIR datatypes every terminology operation
//! speaks in. All fields are optional on the wire; helpers cover the common
//! fully-populated case.

use serde::{Deserialize, Serialize};

/// A reference to a concept defined by a code system
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    /// Canonical URI of the code system, e.g. `http://loinc.org`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Symbol defined by the system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human-readable representation defined by the system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Creates a coding with a system and code
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display: None,
        }
    }

    /// Sets the display text
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

impl std::fmt::Display for Coding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}",
            self.system.as_deref().unwrap_or(""),
            self.code.as_deref().unwrap_or("")
        )
    }
}

/// A concept expressed as one or more codings plus optional free text
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Creates a concept from a single coding, using its display as text
    pub fn from_coding(coding: Coding) -> Self {
        let text = coding.display.clone();
        Self {
            coding: vec![coding],
            text,
        }
    }

    /// Sets the free-text representation
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// The first coding, when any is present
    pub fn primary(&self) -> Option<&Coding> {
        self.coding.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coding_serializes_without_absent_fields() {
        let coding = Coding::new("http://loinc.org", "29463-7");
        assert_eq!(
            serde_json::to_value(&coding).unwrap(),
            json!({"system": "http://loinc.org", "code": "29463-7"})
        );
    }

    #[test]
    fn test_coding_with_display() {
        let coding = Coding::new("http://loinc.org", "29463-7").with_display("Body Weight");
        assert_eq!(coding.display.as_deref(), Some("Body Weight"));
        assert_eq!(coding.to_string(), "http://loinc.org|29463-7");
    }

    #[test]
    fn test_coding_deserializes_sparse_json() {
        let coding: Coding = serde_json::from_str(r#"{"code": "male"}"#).unwrap();
        assert_eq!(coding.code.as_deref(), Some("male"));
        assert_eq!(coding.system, None);
    }

    #[test]
    fn test_codeable_concept_from_coding() {
        let concept = CodeableConcept::from_coding(
            Coding::new("http://snomed.info/sct", "38341003").with_display("Hypertension"),
        );
        assert_eq!(concept.text.as_deref(), Some("Hypertension"));
        assert_eq!(
            concept.primary().and_then(|c| c.code.as_deref()),
            Some("38341003")
        );
    }

    #[test]
    fn test_codeable_concept_round_trip() {
        let raw = json!({
            "coding": [{"system": "http://loinc.org", "code": "8867-4", "display": "Heart rate"}],
            "text": "Heart rate"
        });
        let concept: CodeableConcept = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&concept).unwrap(), raw);
    }
}
