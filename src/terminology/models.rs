//! Terminology operation models
//!
//! # Overview
//!
//! FHIR terminology operations exchange `Parameters` resources: flat lists
//! of named, typed values. This module gives that envelope a typed shape so
//! callers read results through accessors instead of probing raw JSON, plus
//! outcome types for the individual operations (validation, translation,
//! subsumption, expansion).
//!
//! A parameter value is a tagged sum: exactly one `value[x]` field is
//! populated per parameter, and [`Parameter::value`] exposes whichever one
//! it is. Absence is a value here, never a panic.

use crate::domain::coding::Coding;
use crate::domain::errors::RosettaError;
use crate::domain::result::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// A FHIR Parameters resource
///
/// Used both ways: built locally as the POST body of a terminology
/// operation, and parsed from operation responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    #[serde(default = "Parameters::default_resource_type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<Parameter>,
}

/// One named parameter
///
/// FHIR allows many `value[x]` types; the fields below cover the ones
/// terminology servers actually use. Nested `part` entries carry compound
/// results such as translation matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_boolean: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_integer: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_decimal: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_coding: Option<Coding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub part: Vec<Parameter>,
}

/// The value carried by a parameter, as a tagged sum
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue<'a> {
    Boolean(bool),
    String(&'a str),
    Code(&'a str),
    Uri(&'a str),
    Integer(i64),
    Decimal(f64),
    Coding(&'a Coding),
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

impl Parameters {
    fn default_resource_type() -> String {
        "Parameters".to_string()
    }

    /// An empty Parameters resource, ready to be filled via [`Self::with`]
    pub fn new() -> Self {
        Self {
            resource_type: Self::default_resource_type(),
            parameter: Vec::new(),
        }
    }

    /// Appends a parameter, builder style
    pub fn with(mut self, parameter: Parameter) -> Self {
        self.parameter.push(parameter);
        self
    }

    /// Parses a Parameters resource out of a response body
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Protocol`] if the body is not a Parameters
    /// resource.
    pub fn from_response(value: Value) -> Result<Self> {
        let resource_type = value
            .get("resourceType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if resource_type != "Parameters" {
            return Err(RosettaError::Protocol(format!(
                "Expected a Parameters resource, got '{resource_type}'"
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// The first parameter with the given name
    pub fn find(&self, name: &str) -> Option<&Parameter> {
        self.parameter.iter().find(|p| p.name == name)
    }

    /// The boolean value of the named parameter, when present
    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.find(name).and_then(|p| p.value_boolean)
    }

    /// The string value of the named parameter, when present
    pub fn string(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|p| p.value_string.as_deref())
    }

    /// The code value of the named parameter, when present
    pub fn code(&self, name: &str) -> Option<&str> {
        self.find(name).and_then(|p| p.value_code.as_deref())
    }

    /// The coding value of the named parameter, when present
    pub fn coding(&self, name: &str) -> Option<&Coding> {
        self.find(name).and_then(|p| p.value_coding.as_ref())
    }
}

impl Parameter {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self {
            value_boolean: Some(value),
            ..Self::named(name)
        }
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value_string: Some(value.into()),
            ..Self::named(name)
        }
    }

    pub fn code(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value_code: Some(value.into()),
            ..Self::named(name)
        }
    }

    pub fn uri(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value_uri: Some(value.into()),
            ..Self::named(name)
        }
    }

    pub fn coding(name: impl Into<String>, value: Coding) -> Self {
        Self {
            value_coding: Some(value),
            ..Self::named(name)
        }
    }

    /// The populated `value[x]` field, if any
    pub fn value(&self) -> Option<ParameterValue<'_>> {
        if let Some(v) = self.value_boolean {
            return Some(ParameterValue::Boolean(v));
        }
        if let Some(v) = self.value_string.as_deref() {
            return Some(ParameterValue::String(v));
        }
        if let Some(v) = self.value_code.as_deref() {
            return Some(ParameterValue::Code(v));
        }
        if let Some(v) = self.value_uri.as_deref() {
            return Some(ParameterValue::Uri(v));
        }
        if let Some(v) = self.value_integer {
            return Some(ParameterValue::Integer(v));
        }
        if let Some(v) = self.value_decimal {
            return Some(ParameterValue::Decimal(v));
        }
        if let Some(v) = self.value_coding.as_ref() {
            return Some(ParameterValue::Coding(v));
        }
        None
    }

    /// The first part with the given name
    pub fn part(&self, name: &str) -> Option<&Parameter> {
        self.part.iter().find(|p| p.name == name)
    }
}

/// Outcome of a code validation
///
/// Invariant: `display` is only ever populated for a valid code. Servers
/// sometimes return a display alongside a negative result (the closest
/// match); that display is discarded here so callers cannot mistake it for
/// a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub display: Option<String>,
}

impl ValidationOutcome {
    /// Reads a `$validate-code` response
    ///
    /// A response without a boolean `result` parameter counts as invalid.
    pub fn from_parameters(parameters: &Parameters) -> Self {
        let valid = parameters.boolean("result").unwrap_or(false);
        let display = if valid {
            parameters.string("display").map(str::to_string)
        } else {
            None
        };
        Self { valid, display }
    }
}

/// Subsumption relationship between two codes
///
/// The four outcomes `$subsumes` may legally report. Anything else from a
/// server is a protocol violation, not a fifth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubsumptionOutcome {
    Equivalent,
    Subsumes,
    SubsumedBy,
    NotSubsumed,
}

impl SubsumptionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubsumptionOutcome::Equivalent => "equivalent",
            SubsumptionOutcome::Subsumes => "subsumes",
            SubsumptionOutcome::SubsumedBy => "subsumed-by",
            SubsumptionOutcome::NotSubsumed => "not-subsumed",
        }
    }
}

impl std::fmt::Display for SubsumptionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubsumptionOutcome {
    type Err = RosettaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "equivalent" => Ok(SubsumptionOutcome::Equivalent),
            "subsumes" => Ok(SubsumptionOutcome::Subsumes),
            "subsumed-by" => Ok(SubsumptionOutcome::SubsumedBy),
            "not-subsumed" => Ok(SubsumptionOutcome::NotSubsumed),
            other => Err(RosettaError::Protocol(format!(
                "Unknown subsumption outcome '{other}'"
            ))),
        }
    }
}

/// Outcome of a concept translation
///
/// `matched == false` is a normal, non-fatal outcome: the concept map simply
/// has no mapping for the source code.
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub matched: bool,
    pub matches: Vec<ConceptMatch>,
}

/// One candidate mapping from a `$translate` response
#[derive(Debug, Clone)]
pub struct ConceptMatch {
    /// Relationship quality, e.g. `equivalent` or `wider`
    pub equivalence: Option<String>,
    pub concept: Option<Coding>,
}

impl Translation {
    /// The empty "no mapping found" outcome
    pub fn no_match() -> Self {
        Self::default()
    }

    /// Reads a `$translate` response
    pub fn from_parameters(parameters: &Parameters) -> Self {
        let matched = parameters.boolean("result").unwrap_or(false);
        let matches = parameters
            .parameter
            .iter()
            .filter(|p| p.name == "match")
            .map(|p| ConceptMatch {
                equivalence: p
                    .part("equivalence")
                    .and_then(|q| q.value_code.clone().or_else(|| q.value_string.clone())),
                concept: p.part("concept").and_then(|q| q.value_coding.clone()),
            })
            .collect();
        Self { matched, matches }
    }
}

/// Expansion section of a `$expand` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetExpansion {
    /// Total matching concepts across all pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contains: Vec<ExpansionContains>,
}

/// One concept in an expansion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionContains {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl ValueSetExpansion {
    /// Extracts the expansion from a `$expand` response body
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Protocol`] if the body is not a ValueSet or
    /// carries no `expansion` element.
    pub fn from_response(value: Value) -> Result<Self> {
        let resource_type = value
            .get("resourceType")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if resource_type != "ValueSet" {
            return Err(RosettaError::Protocol(format!(
                "Expected a ValueSet, got '{resource_type}'"
            )));
        }
        let expansion = value.get("expansion").cloned().ok_or_else(|| {
            RosettaError::Protocol("ValueSet response carries no expansion".to_string())
        })?;
        Ok(serde_json::from_value(expansion)?)
    }

    /// Number of concepts on this page
    pub fn len(&self) -> usize {
        self.contains.len()
    }

    /// Whether this page carries no concepts
    pub fn is_empty(&self) -> bool {
        self.contains.is_empty()
    }
}
