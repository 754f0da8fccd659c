//! Observation resource builder

use crate::domain::coding::CodeableConcept;
use crate::domain::errors::RosettaError;
use crate::domain::resource::Resource;
use crate::domain::result::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";

/// The value an observation carries
#[derive(Debug, Clone)]
enum ObservationValue {
    Quantity { value: f64, unit: String },
    Text(String),
    Flag(bool),
}

/// Builder for FHIR Observation resources
///
/// An observation needs a subject reference, a coded concept and a value.
/// The effective timestamp defaults to now when not supplied.
///
/// # Example
///
/// ```rust
/// use rosetta::domain::{CodeableConcept, Coding};
/// use rosetta::models::ObservationBuilder;
///
/// let code = CodeableConcept::from_coding(
///     Coding::new("http://loinc.org", "29463-7").with_display("Body weight"),
/// );
/// let observation = ObservationBuilder::new("Patient/123", code)
///     .with_quantity(72.5, "kg")
///     .build()
///     .unwrap();
///
/// assert_eq!(observation.resource_type(), "Observation");
/// ```
#[derive(Debug, Clone)]
pub struct ObservationBuilder {
    subject: String,
    code: CodeableConcept,
    status: String,
    value: Option<ObservationValue>,
    effective: Option<String>,
    categories: Vec<CodeableConcept>,
}

impl ObservationBuilder {
    /// Starts an observation for the given subject and concept
    ///
    /// # Arguments
    ///
    /// * `subject` - reference to the observed patient, e.g. `Patient/123`
    /// * `code` - what was observed, as a coded concept
    pub fn new(subject: impl Into<String>, code: CodeableConcept) -> Self {
        Self {
            subject: subject.into(),
            code,
            status: "final".to_string(),
            value: None,
            effective: None,
            categories: Vec::new(),
        }
    }

    /// Observation status, `final` when not set
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// A numeric value with a UCUM unit
    pub fn with_quantity(mut self, value: f64, unit: impl Into<String>) -> Self {
        self.value = Some(ObservationValue::Quantity {
            value,
            unit: unit.into(),
        });
        self
    }

    /// A free-text value
    pub fn with_value_string(mut self, value: impl Into<String>) -> Self {
        self.value = Some(ObservationValue::Text(value.into()));
        self
    }

    /// A boolean value
    pub fn with_value_boolean(mut self, value: bool) -> Self {
        self.value = Some(ObservationValue::Flag(value));
        self
    }

    /// When the observation was made; defaults to now
    pub fn with_effective(mut self, when: DateTime<Utc>) -> Self {
        self.effective = Some(when.to_rfc3339_opts(SecondsFormat::Secs, true));
        self
    }

    /// Adds a category, e.g. vital-signs
    pub fn with_category(mut self, category: CodeableConcept) -> Self {
        self.categories.push(category);
        self
    }

    /// Assembles the Observation resource
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Validation`] when the subject reference is
    /// blank, the concept carries neither coding nor text, or no value was
    /// set.
    pub fn build(self) -> Result<Resource> {
        if self.subject.trim().is_empty() {
            return Err(RosettaError::validation(
                "Observation requires a subject reference",
            ));
        }
        if self.code.coding.is_empty() && self.code.text.is_none() {
            return Err(RosettaError::validation(
                "Observation code requires a coding or text",
            ));
        }
        let value = self.value.ok_or_else(|| {
            RosettaError::validation("Observation requires a value")
        })?;

        let effective = self
            .effective
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let mut observation = json!({
            "resourceType": "Observation",
            "status": self.status,
            "code": self.code,
            "subject": {"reference": self.subject},
            "effectiveDateTime": effective,
        });

        match value {
            ObservationValue::Quantity { value, unit } => {
                observation["valueQuantity"] = json!({
                    "value": value,
                    "unit": unit,
                    "system": UCUM_SYSTEM,
                    "code": unit,
                });
            }
            ObservationValue::Text(text) => {
                observation["valueString"] = json!(text);
            }
            ObservationValue::Flag(flag) => {
                observation["valueBoolean"] = json!(flag);
            }
        }

        if !self.categories.is_empty() {
            observation["category"] = json!(self.categories);
        }

        Resource::new(observation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coding::Coding;

    fn weight_code() -> CodeableConcept {
        CodeableConcept::from_coding(
            Coding::new("http://loinc.org", "29463-7").with_display("Body weight"),
        )
    }

    #[test]
    fn test_quantity_observation() {
        let observation = ObservationBuilder::new("Patient/123", weight_code())
            .with_quantity(72.5, "kg")
            .build()
            .unwrap();

        assert_eq!(observation.resource_type(), "Observation");
        assert_eq!(observation.get("status").unwrap(), "final");
        assert_eq!(observation.get("subject").unwrap()["reference"], "Patient/123");

        let quantity = observation.get("valueQuantity").unwrap();
        assert_eq!(quantity["value"], 72.5);
        assert_eq!(quantity["unit"], "kg");
        assert_eq!(quantity["system"], UCUM_SYSTEM);
    }

    #[test]
    fn test_effective_defaults_to_now() {
        let observation = ObservationBuilder::new("Patient/123", weight_code())
            .with_quantity(72.5, "kg")
            .build()
            .unwrap();

        let effective = observation.get("effectiveDateTime").unwrap();
        let stamped = effective.as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamped).is_ok());
    }

    #[test]
    fn test_explicit_effective_is_kept() {
        let when = DateTime::parse_from_rfc3339("2024-06-01T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let observation = ObservationBuilder::new("Patient/123", weight_code())
            .with_quantity(72.5, "kg")
            .with_effective(when)
            .build()
            .unwrap();

        assert_eq!(
            observation.get("effectiveDateTime").unwrap(),
            "2024-06-01T10:30:00Z"
        );
    }

    #[test]
    fn test_string_and_boolean_values() {
        let observation = ObservationBuilder::new("Patient/123", weight_code())
            .with_value_string("within normal limits")
            .build()
            .unwrap();
        assert_eq!(observation.get("valueString").unwrap(), "within normal limits");

        let observation = ObservationBuilder::new("Patient/123", weight_code())
            .with_value_boolean(true)
            .with_status("preliminary")
            .build()
            .unwrap();
        assert_eq!(observation.get("valueBoolean").unwrap(), true);
        assert_eq!(observation.get("status").unwrap(), "preliminary");
    }

    #[test]
    fn test_category_serialization() {
        let vital_signs = CodeableConcept::from_coding(Coding::new(
            "http://terminology.hl7.org/CodeSystem/observation-category",
            "vital-signs",
        ));
        let observation = ObservationBuilder::new("Patient/123", weight_code())
            .with_quantity(98.6, "degF")
            .with_category(vital_signs)
            .build()
            .unwrap();

        assert_eq!(
            observation.get("category").unwrap()[0]["coding"][0]["code"],
            "vital-signs"
        );
    }

    #[test]
    fn test_missing_value_is_rejected() {
        let err = ObservationBuilder::new("Patient/123", weight_code())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("value"));
    }

    #[test]
    fn test_blank_subject_is_rejected() {
        let err = ObservationBuilder::new("", weight_code())
            .with_quantity(1.0, "kg")
            .build()
            .unwrap_err();
        assert!(matches!(err, RosettaError::Validation { .. }));
    }

    #[test]
    fn test_empty_concept_is_rejected() {
        let empty = CodeableConcept::default();
        let err = ObservationBuilder::new("Patient/123", empty)
            .with_quantity(1.0, "kg")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("coding or text"));
    }
}
