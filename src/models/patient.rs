//! Patient resource builder

use crate::domain::errors::RosettaError;
use crate::domain::resource::Resource;
use crate::domain::result::Result;
use serde_json::json;

/// Builder for FHIR Patient resources
///
/// A patient needs a family name and at least one given name; everything
/// else is optional.
///
/// # Example
///
/// ```rust
/// use rosetta::models::PatientBuilder;
///
/// let patient = PatientBuilder::new("Smith", "John")
///     .with_given("Robert")
///     .with_gender("male")
///     .with_birth_date("1970-03-15")
///     .build()
///     .unwrap();
///
/// assert_eq!(patient.resource_type(), "Patient");
/// ```
#[derive(Debug, Clone)]
pub struct PatientBuilder {
    family: String,
    given: Vec<String>,
    gender: Option<String>,
    birth_date: Option<String>,
    identifiers: Vec<(String, String)>,
}

impl PatientBuilder {
    pub fn new(family: impl Into<String>, given: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            given: vec![given.into()],
            gender: None,
            birth_date: None,
            identifiers: Vec::new(),
        }
    }

    /// Adds another given name
    pub fn with_given(mut self, name: impl Into<String>) -> Self {
        self.given.push(name.into());
        self
    }

    /// Administrative gender: `male`, `female`, `other` or `unknown`
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    /// Birth date in `YYYY-MM-DD` form
    pub fn with_birth_date(mut self, date: impl Into<String>) -> Self {
        self.birth_date = Some(date.into());
        self
    }

    /// Adds an identifier, e.g. a medical record number
    pub fn with_identifier(mut self, system: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.push((system.into(), value.into()));
        self
    }

    /// Assembles the Patient resource
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Validation`] when the family name is blank,
    /// no usable given name remains, or the birth date is not a valid
    /// `YYYY-MM-DD` date.
    pub fn build(self) -> Result<Resource> {
        if self.family.trim().is_empty() {
            return Err(RosettaError::validation("Patient requires a family name"));
        }

        let given: Vec<&str> = self
            .given
            .iter()
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
            .collect();
        if given.is_empty() {
            return Err(RosettaError::validation(
                "Patient requires at least one given name",
            ));
        }

        if let Some(date) = &self.birth_date {
            chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                RosettaError::validation(format!("Invalid birth date '{date}', expected YYYY-MM-DD"))
            })?;
        }

        let mut patient = json!({
            "resourceType": "Patient",
            "name": [{
                "use": "official",
                "family": self.family,
                "given": given,
            }]
        });

        if let Some(gender) = self.gender {
            patient["gender"] = json!(gender);
        }
        if let Some(birth_date) = self.birth_date {
            patient["birthDate"] = json!(birth_date);
        }
        if !self.identifiers.is_empty() {
            let identifiers: Vec<_> = self
                .identifiers
                .iter()
                .map(|(system, value)| json!({"system": system, "value": value}))
                .collect();
            patient["identifier"] = json!(identifiers);
        }

        Resource::new(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_patient() {
        let patient = PatientBuilder::new("Smith", "John").build().unwrap();
        assert_eq!(patient.resource_type(), "Patient");
        assert_eq!(patient.get("name").unwrap()[0]["family"], "Smith");
        assert_eq!(patient.get("name").unwrap()[0]["given"][0], "John");
        assert_eq!(patient.get("gender"), None);
    }

    #[test]
    fn test_full_patient() {
        let patient = PatientBuilder::new("Smith", "John")
            .with_given("Robert")
            .with_gender("male")
            .with_birth_date("1970-03-15")
            .with_identifier("http://hospital.example.org/mrn", "MRN-12345")
            .build()
            .unwrap();

        assert_eq!(patient.get("gender").unwrap(), "male");
        assert_eq!(patient.get("birthDate").unwrap(), "1970-03-15");
        assert_eq!(patient.get("name").unwrap()[0]["given"][1], "Robert");
        assert_eq!(
            patient.get("identifier").unwrap()[0]["value"],
            "MRN-12345"
        );
    }

    #[test]
    fn test_blank_family_is_rejected() {
        let err = PatientBuilder::new("  ", "John").build().unwrap_err();
        assert!(matches!(err, RosettaError::Validation { .. }));
    }

    #[test]
    fn test_blank_given_names_are_rejected() {
        let err = PatientBuilder::new("Smith", " ").build().unwrap_err();
        assert!(err.to_string().contains("given name"));
    }

    #[test]
    fn test_invalid_birth_date_is_rejected() {
        let err = PatientBuilder::new("Smith", "John")
            .with_birth_date("15/03/1970")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }
}
