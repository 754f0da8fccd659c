//! FHIR resource domain model
//!
//! This module defines the opaque [`Resource`] type carried through the
//! resource client. Rosetta does not model the hundred-plus FHIR resource
//! kinds; it guarantees the envelope fields it needs (`resourceType`, `id`)
//! and leaves everything else untouched for the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::RosettaError;
use super::result::Result;

/// An opaque FHIR resource
///
/// A resource is a dynamically shaped JSON object identified by its
/// `resourceType` and, once persisted, a server-assigned `id`. Construction
/// enforces that `resourceType` is present and a non-empty string; the rest
/// of the document passes through unmodified.
///
/// Deserialization applies the same check, so a resource parsed out of a
/// server response (directly or inside a [`Bundle`](crate::client::Bundle)
/// entry) always has a usable type.
///
/// # Examples
///
/// ```
/// use rosetta::domain::Resource;
/// use serde_json::json;
///
/// let patient = Resource::new(json!({
///     "resourceType": "Patient",
///     "name": [{"family": "Chalmers", "given": ["Peter"]}],
/// }))
/// .unwrap();
///
/// assert_eq!(patient.resource_type(), "Patient");
/// assert_eq!(patient.id(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Resource(Value);

impl Resource {
    /// Creates a resource from caller-supplied JSON
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Validation`] if the value is not a JSON object
    /// or carries no `resourceType`.
    pub fn new(value: Value) -> Result<Self> {
        match envelope_error(&value) {
            Some(reason) => Err(RosettaError::validation(reason)),
            None => Ok(Resource(value)),
        }
    }

    /// Creates a resource from a server response body
    ///
    /// Identical check to [`Resource::new`], but a failure is a
    /// [`RosettaError::Protocol`]: the server broke the FHIR envelope
    /// contract, the caller did nothing wrong.
    pub fn from_response(value: Value) -> Result<Self> {
        match envelope_error(&value) {
            Some(reason) => Err(RosettaError::Protocol(reason)),
            None => Ok(Resource(value)),
        }
    }

    /// The `resourceType` of this resource, e.g. `"Patient"`
    pub fn resource_type(&self) -> &str {
        self.0
            .get("resourceType")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The logical `id`, if the resource has been assigned one
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    /// A relative reference of the form `Type/id`, if the resource has an id
    pub fn reference(&self) -> Option<String> {
        self.id().map(|id| format!("{}/{id}", self.resource_type()))
    }

    /// Looks up a top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Borrows the underlying JSON document
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the resource, returning the underlying JSON document
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl TryFrom<Value> for Resource {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match envelope_error(&value) {
            Some(reason) => Err(reason),
            None => Ok(Resource(value)),
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reference() {
            Some(reference) => write!(f, "{reference}"),
            None => write!(f, "{} (no id)", self.resource_type()),
        }
    }
}

fn envelope_error(value: &Value) -> Option<String> {
    let Some(object) = value.as_object() else {
        return Some("resource must be a JSON object".to_string());
    };
    match object.get("resourceType").and_then(Value::as_str) {
        Some(kind) if !kind.is_empty() => None,
        Some(_) => Some("resourceType must not be empty".to_string()),
        None => Some("resource has no resourceType".to_string()),
    }
}
