//! Terminology server client
//!
//! # Overview
//!
//! Client for FHIR terminology operations: code validation, lookup, value
//! set expansion, concept translation and subsumption testing. Operations
//! POST `Parameters` bodies except `$expand`, which the servers serve as a
//! GET with query parameters.
//!
//! Code systems can be named by alias (`snomed`, `loinc`, `icd10`, ...)
//! anywhere a system is accepted; aliases resolve through
//! [`resolve_system`](crate::terminology::systems::resolve_system) and
//! unknown values pass through untouched.
//!
//! # Example
//!
//! ```rust,no_run
//! use rosetta::config::ServerConfig;
//! use rosetta::terminology::TerminologyClient;
//!
//! # async fn example() -> rosetta::domain::Result<()> {
//! let config = ServerConfig::new("https://tx.fhir.org/r4");
//! let terminology = TerminologyClient::new(&config)?;
//!
//! if terminology.is_valid_code("29463-7", "loinc").await? {
//!     let display = terminology.get_display_name("loinc", "29463-7").await?;
//!     println!("29463-7 = {}", display.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::transport::HttpTransport;
use crate::config::ServerConfig;
use crate::domain::coding::Coding;
use crate::domain::errors::RosettaError;
use crate::domain::result::Result;
use crate::terminology::models::{
    Parameter, Parameters, SubsumptionOutcome, Translation, ValidationOutcome, ValueSetExpansion,
};
use crate::terminology::systems::resolve_system;

/// Default result limit for [`TerminologyClient::search_value_set`]
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Identifies the value set to expand
///
/// A value set is addressed either by canonical URL or by server-local
/// resource id. The two are mutually exclusive, which this type makes
/// unrepresentable rather than checking at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSetRef<'a> {
    /// Canonical URL, e.g. `http://hl7.org/fhir/ValueSet/administrative-gender`
    Url(&'a str),
    /// Server-local resource id
    Id(&'a str),
}

impl std::fmt::Display for ValueSetRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSetRef::Url(url) => write!(f, "{url}"),
            ValueSetRef::Id(id) => write!(f, "ValueSet/{id}"),
        }
    }
}

/// Options for value set expansion
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Text filter applied to the expansion
    pub filter: Option<String>,
    /// Starting index for paging
    pub offset: u64,
    /// Maximum number of codes per page
    pub count: u64,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            filter: None,
            offset: 0,
            count: 100,
        }
    }
}

impl ExpandOptions {
    pub fn filtered(text: impl Into<String>) -> Self {
        Self {
            filter: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Client for FHIR terminology operations
///
/// Cloning is cheap and shares the underlying connection pool. Dropping the
/// last clone closes idle connections, there is no separate shutdown call.
#[derive(Debug, Clone)]
pub struct TerminologyClient {
    transport: HttpTransport,
}

impl TerminologyClient {
    /// Creates a client for the given terminology server
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Configuration`] if the base URL is invalid or
    /// the underlying HTTP client cannot be constructed.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    /// Builds a client on an existing transport
    pub(crate) fn with_transport(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// The server base URL this client talks to
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Validates a code against a code system or value set
    ///
    /// With `value_set_url` the check is value set membership
    /// (`ValueSet/$validate-code`); without it the check is existence in the
    /// code system (`CodeSystem/$validate-code`). Returns the raw
    /// `Parameters` response; use [`Self::is_valid_code`] or
    /// [`Self::validation_outcome`] for the digested forms.
    ///
    /// # Arguments
    ///
    /// * `code` - the code to validate, e.g. `29463-7`
    /// * `system` - code system URL or alias, e.g. `loinc`
    /// * `display` - optional display name to validate alongside the code
    /// * `value_set_url` - optional value set to check membership against
    pub async fn validate_code(
        &self,
        code: &str,
        system: &str,
        display: Option<&str>,
        value_set_url: Option<&str>,
    ) -> Result<Parameters> {
        require_non_empty(code, "code")?;
        require_non_empty(system, "code system")?;

        let system_url = resolve_system(system);
        let (path, body) = validate_request(code, system_url, display, value_set_url);

        tracing::debug!(code, system = system_url, path, "Validating code");
        let response = self.transport.post(path, &serde_json::to_value(&body)?).await?;
        Parameters::from_response(response)
    }

    /// Whether a code is valid in a code system
    ///
    /// A response without a boolean `result` parameter counts as invalid.
    /// Transport and server errors propagate; only the server's verdict is
    /// folded into the boolean.
    pub async fn is_valid_code(&self, code: &str, system: &str) -> Result<bool> {
        let parameters = self.validate_code(code, system, None, None).await?;
        Ok(parameters.boolean("result").unwrap_or(false))
    }

    /// Validates a code and digests the response
    ///
    /// See [`ValidationOutcome`] for the display handling rules.
    pub async fn validation_outcome(&self, code: &str, system: &str) -> Result<ValidationOutcome> {
        let parameters = self.validate_code(code, system, None, None).await?;
        Ok(ValidationOutcome::from_parameters(&parameters))
    }

    /// Looks up details for a code
    ///
    /// Returns the raw `Parameters` response carrying the code's display,
    /// designations and any requested properties.
    ///
    /// # Arguments
    ///
    /// * `system` - code system URL or alias
    /// * `code` - the code to look up
    /// * `properties` - specific properties to request; empty for the
    ///   server's default set
    pub async fn lookup_code(
        &self,
        system: &str,
        code: &str,
        properties: &[&str],
    ) -> Result<Parameters> {
        require_non_empty(system, "code system")?;
        require_non_empty(code, "code")?;

        let system_url = resolve_system(system);
        let body = lookup_request(system_url, code, properties);

        tracing::debug!(code, system = system_url, "Looking up code");
        let response = self
            .transport
            .post("CodeSystem/$lookup", &serde_json::to_value(&body)?)
            .await?;
        Parameters::from_response(response)
    }

    /// The display name for a code, when the server knows one
    ///
    /// Absence is an answer here, not an error: an unknown code (404) and a
    /// lookup response without a `display` both yield `Ok(None)`. Every
    /// other failure propagates.
    pub async fn get_display_name(&self, system: &str, code: &str) -> Result<Option<String>> {
        match self.lookup_code(system, code, &[]).await {
            Ok(parameters) => Ok(parameters.string("display").map(str::to_string)),
            Err(RosettaError::ResourceNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Expands a value set into its member codes
    ///
    /// Returns one page of the expansion; callers page through large value
    /// sets by advancing `options.offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Protocol`] if the server responds without an
    /// expansion element.
    pub async fn expand_value_set(
        &self,
        target: ValueSetRef<'_>,
        options: &ExpandOptions,
    ) -> Result<ValueSetExpansion> {
        let (ValueSetRef::Url(value) | ValueSetRef::Id(value)) = target;
        require_non_empty(value, "value set reference")?;

        let (path, query) = expand_query(target, options);

        tracing::debug!(target = %target, offset = options.offset, count = options.count, "Expanding value set");
        let response = self.transport.get(&path, &query).await?;
        let expansion = ValueSetExpansion::from_response(response)?;
        tracing::debug!(target = %target, codes = expansion.len(), "Expansion complete");
        Ok(expansion)
    }

    /// Searches for codes within a value set by display text
    ///
    /// Convenience over [`Self::expand_value_set`] with a text filter. At
    /// most `max_results` codes come back even if the server over-delivers.
    pub async fn search_value_set(
        &self,
        value_set_url: &str,
        text: &str,
        max_results: usize,
    ) -> Result<Vec<crate::terminology::models::ExpansionContains>> {
        let options = ExpandOptions {
            filter: Some(text.to_string()),
            offset: 0,
            count: max_results as u64,
        };
        let expansion = self
            .expand_value_set(ValueSetRef::Url(value_set_url), &options)
            .await?;

        let mut contains = expansion.contains;
        contains.truncate(max_results);
        Ok(contains)
    }

    /// Translates a code between code systems through a concept map
    ///
    /// "No mapping exists" is a normal outcome, not an error: both an
    /// HTTP 422 response and a `result=false` body come back as
    /// `Translation { matched: false, .. }`. Connection failures, server
    /// errors and other rejections propagate, so callers can tell a missing
    /// mapping from a failing translation service.
    pub async fn translate_code(
        &self,
        code: &str,
        source_system: &str,
        target_system: &str,
        concept_map_url: Option<&str>,
    ) -> Result<Translation> {
        require_non_empty(code, "code")?;
        require_non_empty(source_system, "source system")?;
        require_non_empty(target_system, "target system")?;

        let source_url = resolve_system(source_system);
        let target_url = resolve_system(target_system);
        let body = translate_request(code, source_url, target_url, concept_map_url);

        tracing::debug!(code, source = source_url, target = target_url, "Translating code");
        let response = self
            .transport
            .post("ConceptMap/$translate", &serde_json::to_value(&body)?)
            .await;

        match response {
            Ok(raw) => {
                let parameters = Parameters::from_response(raw)?;
                Ok(Translation::from_parameters(&parameters))
            }
            Err(RosettaError::Validation {
                status: Some(422), ..
            }) => {
                tracing::debug!(code, source = source_url, "No mapping found");
                Ok(Translation::no_match())
            }
            Err(e) => Err(e),
        }
    }

    /// Tests the hierarchical relationship between two codes
    ///
    /// Answers whether `code_a` subsumes `code_b` within one code system.
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Protocol`] if the server reports no outcome
    /// or one outside the four defined relationships.
    pub async fn check_subsumption(
        &self,
        code_a: &str,
        code_b: &str,
        system: &str,
    ) -> Result<SubsumptionOutcome> {
        require_non_empty(code_a, "code")?;
        require_non_empty(code_b, "code")?;
        require_non_empty(system, "code system")?;

        let system_url = resolve_system(system);
        let body = subsumption_request(system_url, code_a, code_b);

        tracing::debug!(code_a, code_b, system = system_url, "Checking subsumption");
        let response = self
            .transport
            .post("CodeSystem/$subsumes", &serde_json::to_value(&body)?)
            .await?;
        let parameters = Parameters::from_response(response)?;

        let outcome = parameters.code("outcome").ok_or_else(|| {
            RosettaError::Protocol("Subsumption response carries no outcome".to_string())
        })?;
        outcome.parse()
    }
}

fn validate_request(
    code: &str,
    system_url: &str,
    display: Option<&str>,
    value_set_url: Option<&str>,
) -> (&'static str, Parameters) {
    match value_set_url {
        Some(vs_url) => {
            let mut coding = Coding::new(system_url, code);
            if let Some(display) = display {
                coding = coding.with_display(display);
            }
            let body = Parameters::new()
                .with(Parameter::uri("url", vs_url))
                .with(Parameter::coding("coding", coding));
            ("ValueSet/$validate-code", body)
        }
        None => {
            let mut body = Parameters::new()
                .with(Parameter::uri("url", system_url))
                .with(Parameter::code("code", code));
            if let Some(display) = display {
                body = body.with(Parameter::string("display", display));
            }
            ("CodeSystem/$validate-code", body)
        }
    }
}

fn lookup_request(system_url: &str, code: &str, properties: &[&str]) -> Parameters {
    let mut body = Parameters::new()
        .with(Parameter::uri("system", system_url))
        .with(Parameter::code("code", code));
    for property in properties {
        body = body.with(Parameter::code("property", *property));
    }
    body
}

fn translate_request(
    code: &str,
    source_url: &str,
    target_url: &str,
    concept_map_url: Option<&str>,
) -> Parameters {
    let mut body = Parameters::new();
    if let Some(map_url) = concept_map_url {
        body = body.with(Parameter::uri("url", map_url));
    }
    body.with(Parameter::uri("system", source_url))
        .with(Parameter::code("code", code))
        .with(Parameter::uri("targetSystem", target_url))
}

fn subsumption_request(system_url: &str, code_a: &str, code_b: &str) -> Parameters {
    Parameters::new()
        .with(Parameter::uri("system", system_url))
        .with(Parameter::code("codeA", code_a))
        .with(Parameter::code("codeB", code_b))
}

fn expand_query(
    target: ValueSetRef<'_>,
    options: &ExpandOptions,
) -> (String, Vec<(&'static str, String)>) {
    let path = match target {
        ValueSetRef::Url(_) => "ValueSet/$expand".to_string(),
        ValueSetRef::Id(id) => format!("ValueSet/{id}/$expand"),
    };

    let mut query = Vec::new();
    if let ValueSetRef::Url(url) = target {
        query.push(("url", url.to_string()));
    }
    if let Some(filter) = &options.filter {
        query.push(("filter", filter.clone()));
    }
    query.push(("offset", options.offset.to_string()));
    query.push(("count", options.count.to_string()));

    (path, query)
}

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RosettaError::validation(format!("Missing {what}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expand_options_defaults() {
        let options = ExpandOptions::default();
        assert_eq!(options.filter, None);
        assert_eq!(options.offset, 0);
        assert_eq!(options.count, 100);
    }

    #[test]
    fn test_code_system_validate_request() {
        let (path, body) = validate_request("29463-7", "http://loinc.org", None, None);
        assert_eq!(path, "CodeSystem/$validate-code");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "resourceType": "Parameters",
                "parameter": [
                    {"name": "url", "valueUri": "http://loinc.org"},
                    {"name": "code", "valueCode": "29463-7"}
                ]
            })
        );
    }

    #[test]
    fn test_value_set_validate_request_uses_coding() {
        let (path, body) = validate_request(
            "male",
            "http://hl7.org/fhir/administrative-gender",
            Some("Male"),
            Some("http://hl7.org/fhir/ValueSet/administrative-gender"),
        );
        assert_eq!(path, "ValueSet/$validate-code");

        let raw = serde_json::to_value(&body).unwrap();
        assert_eq!(
            raw["parameter"][0],
            json!({"name": "url", "valueUri": "http://hl7.org/fhir/ValueSet/administrative-gender"})
        );
        assert_eq!(
            raw["parameter"][1]["valueCoding"],
            json!({
                "system": "http://hl7.org/fhir/administrative-gender",
                "code": "male",
                "display": "Male"
            })
        );
    }

    #[test]
    fn test_lookup_request_with_properties() {
        let body = lookup_request("http://snomed.info/sct", "38341003", &["parent", "child"]);
        let raw = serde_json::to_value(&body).unwrap();
        let names: Vec<_> = raw["parameter"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["system", "code", "property", "property"]);
        assert_eq!(raw["parameter"][2]["valueCode"], "parent");
    }

    #[test]
    fn test_translate_request_shape() {
        let body = translate_request(
            "I10",
            "http://hl7.org/fhir/sid/icd-10",
            "http://snomed.info/sct",
            None,
        );
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "resourceType": "Parameters",
                "parameter": [
                    {"name": "system", "valueUri": "http://hl7.org/fhir/sid/icd-10"},
                    {"name": "code", "valueCode": "I10"},
                    {"name": "targetSystem", "valueUri": "http://snomed.info/sct"}
                ]
            })
        );
    }

    #[test]
    fn test_translate_request_with_concept_map() {
        let body = translate_request("I10", "a", "b", Some("http://example.org/map"));
        let raw = serde_json::to_value(&body).unwrap();
        assert_eq!(
            raw["parameter"][0],
            json!({"name": "url", "valueUri": "http://example.org/map"})
        );
    }

    #[test]
    fn test_subsumption_request_shape() {
        let body = subsumption_request("http://snomed.info/sct", "49601007", "38341003");
        let raw = serde_json::to_value(&body).unwrap();
        assert_eq!(raw["parameter"][1], json!({"name": "codeA", "valueCode": "49601007"}));
        assert_eq!(raw["parameter"][2], json!({"name": "codeB", "valueCode": "38341003"}));
    }

    #[test]
    fn test_expand_query_by_url() {
        let options = ExpandOptions::filtered("press");
        let (path, query) = expand_query(
            ValueSetRef::Url("http://hl7.org/fhir/ValueSet/observation-codes"),
            &options,
        );
        assert_eq!(path, "ValueSet/$expand");
        assert_eq!(
            query,
            vec![
                ("url", "http://hl7.org/fhir/ValueSet/observation-codes".to_string()),
                ("filter", "press".to_string()),
                ("offset", "0".to_string()),
                ("count", "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_expand_query_by_id_has_no_url_param() {
        let (path, query) = expand_query(ValueSetRef::Id("vs-genders"), &ExpandOptions::default());
        assert_eq!(path, "ValueSet/vs-genders/$expand");
        assert!(query.iter().all(|(name, _)| *name != "url"));
    }

    #[tokio::test]
    async fn test_empty_code_is_rejected_before_dispatch() {
        let config = ServerConfig::new("https://tx.example.com/r4");
        let client = TerminologyClient::new(&config).unwrap();

        let err = client.is_valid_code("", "loinc").await.unwrap_err();
        assert!(matches!(err, RosettaError::Validation { status: None, .. }));

        let err = client.check_subsumption("a", "b", " ").await.unwrap_err();
        assert!(matches!(err, RosettaError::Validation { status: None, .. }));
    }

    #[test]
    fn test_value_set_ref_display() {
        assert_eq!(ValueSetRef::Url("http://x/vs").to_string(), "http://x/vs");
        assert_eq!(ValueSetRef::Id("genders").to_string(), "ValueSet/genders");
    }
}
