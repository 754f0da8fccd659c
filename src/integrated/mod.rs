//! Integrated FHIR client with terminology support
//!
//! # Overview
//!
//! [`IntegratedClient`] composes a [`ResourceClient`] and a
//! [`TerminologyClient`] so coded healthcare data is validated and enriched
//! as it moves:
//!
//! - codes are checked against the terminology server before resources are
//!   created
//! - retrieved resources gain human-readable display names on their codings
//! - condition searches can follow terminology hierarchies ($subsumes)
//! - codings can be translated between code systems for exchange
//!
//! Both underlying clients share Rust ownership as their release mechanism:
//! dropping the last handle closes idle connections, there is no separate
//! shutdown call.
//!
//! # Example
//!
//! ```rust,no_run
//! use rosetta::config::RosettaConfig;
//! use rosetta::integrated::IntegratedClient;
//!
//! # async fn example() -> rosetta::domain::Result<()> {
//! let client = IntegratedClient::new(&RosettaConfig::default())?;
//!
//! // Validated against LOINC before it is stored
//! let observation = client
//!     .create_observation("123", "29463-7", "loinc", 70.5, "kg")
//!     .await?;
//! println!("Created {observation}");
//! # Ok(())
//! # }
//! ```

use crate::client::ResourceClient;
use crate::config::RosettaConfig;
use crate::domain::coding::{CodeableConcept, Coding};
use crate::domain::errors::RosettaError;
use crate::domain::resource::Resource;
use crate::domain::result::Result;
use crate::terminology::systems::resolve_system;
use crate::terminology::TerminologyClient;
use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

const CONDITION_CLINICAL_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/condition-clinical";

/// FHIR client with integrated terminology validation and enrichment
pub struct IntegratedClient {
    fhir: ResourceClient,
    terminology: TerminologyClient,
    validate_codes: bool,
    enrich_display: bool,
}

impl IntegratedClient {
    /// Creates a client pair from configuration
    ///
    /// Code validation and display enrichment start enabled; use
    /// [`Self::with_code_validation`] and [`Self::with_display_enrichment`]
    /// to turn them off.
    pub fn new(config: &RosettaConfig) -> Result<Self> {
        let client = Self {
            fhir: ResourceClient::new(&config.fhir)?,
            terminology: TerminologyClient::new(&config.terminology)?,
            validate_codes: true,
            enrich_display: true,
        };
        tracing::info!(
            fhir = client.fhir.base_url(),
            terminology = client.terminology.base_url(),
            "Integrated client initialized"
        );
        Ok(client)
    }

    /// Composes a client from already-built parts
    pub fn with_clients(fhir: ResourceClient, terminology: TerminologyClient) -> Self {
        Self {
            fhir,
            terminology,
            validate_codes: true,
            enrich_display: true,
        }
    }

    /// Whether codes are validated before create operations
    pub fn with_code_validation(mut self, validate: bool) -> Self {
        self.validate_codes = validate;
        self
    }

    /// Whether retrieved resources are enriched with display names
    pub fn with_display_enrichment(mut self, enrich: bool) -> Self {
        self.enrich_display = enrich;
        self
    }

    /// The underlying resource client
    pub fn fhir(&self) -> &ResourceClient {
        &self.fhir
    }

    /// The underlying terminology client
    pub fn terminology(&self) -> &TerminologyClient {
        &self.terminology
    }

    /// Creates an observation after validating its code
    ///
    /// The code is checked against the terminology server first, and the
    /// stored resource carries the server's display name for it.
    ///
    /// # Arguments
    ///
    /// * `patient_id` - Patient resource id
    /// * `code` - observation code, e.g. `29463-7` for body weight
    /// * `system` - code system alias or URL, e.g. `loinc`
    /// * `value` - numeric value
    /// * `unit` - UCUM unit, e.g. `kg`
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Validation`] when the code does not exist in
    /// the code system.
    pub async fn create_observation(
        &self,
        patient_id: &str,
        code: &str,
        system: &str,
        value: f64,
        unit: &str,
    ) -> Result<Resource> {
        require_non_empty(patient_id, "patient id")?;
        self.check_code(code, system).await?;

        let concept = self.coded_concept(code, system).await?;
        let observation =
            crate::models::ObservationBuilder::new(format!("Patient/{patient_id}"), concept)
                .with_quantity(value, unit)
                .build()?;

        self.fhir.create(&observation).await
    }

    /// Creates an active condition after validating its diagnosis code
    ///
    /// # Errors
    ///
    /// Returns [`RosettaError::Validation`] when the diagnosis code does
    /// not exist in the code system.
    pub async fn create_condition(
        &self,
        patient_id: &str,
        code: &str,
        system: &str,
    ) -> Result<Resource> {
        require_non_empty(patient_id, "patient id")?;
        self.check_code(code, system).await?;

        let concept = self.coded_concept(code, system).await?;
        let condition = json!({
            "resourceType": "Condition",
            "clinicalStatus": {
                "coding": [{"system": CONDITION_CLINICAL_SYSTEM, "code": "active"}]
            },
            "code": concept,
            "subject": {"reference": format!("Patient/{patient_id}")},
        });

        self.fhir.create(&Resource::new(condition)?).await
    }

    /// Reads a resource and enriches its codings with display names
    ///
    /// Enrichment is best effort: codings whose lookup fails keep their
    /// original shape, with the failure logged.
    pub async fn read_enriched(&self, resource_type: &str, id: &str) -> Result<Resource> {
        let resource = self.fhir.read(resource_type, id).await?;
        if self.enrich_display {
            self.enrich_codings(resource).await
        } else {
            Ok(resource)
        }
    }

    /// Adds display names to every coding in the resource that lacks one
    ///
    /// Runs in two phases: first the tree is scanned for distinct
    /// `(system, code)` pairs missing a display, then all lookups run
    /// concurrently and the results are patched back in. `text` on a coding
    /// container is filled from its first display when absent.
    pub async fn enrich_codings(&self, resource: Resource) -> Result<Resource> {
        let mut value = resource.into_value();

        let mut targets = BTreeSet::new();
        collect_missing_displays(&value, &mut targets);

        if !targets.is_empty() {
            let pairs: Vec<(String, String)> = targets.into_iter().collect();
            let lookups = pairs
                .iter()
                .map(|(system, code)| self.terminology.get_display_name(system, code));
            let results = join_all(lookups).await;

            let mut displays = BTreeMap::new();
            for ((system, code), result) in pairs.into_iter().zip(results) {
                match result {
                    Ok(Some(display)) => {
                        displays.insert((system, code), display);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(
                            system,
                            code,
                            error = %e,
                            "Display lookup failed during enrichment"
                        );
                    }
                }
            }
            apply_displays(&mut value, &displays);
        }

        Resource::new(value)
    }

    /// Finds the patient's conditions that fall under a parent concept
    ///
    /// Fetches all conditions for the patient, then keeps those whose coding
    /// the terminology server reports as equivalent to or subsumed by
    /// `parent_code`. A failed subsumption check skips that condition rather
    /// than failing the whole search.
    pub async fn find_related_conditions(
        &self,
        patient_id: &str,
        parent_code: &str,
        system: &str,
    ) -> Result<Vec<Resource>> {
        require_non_empty(patient_id, "patient id")?;
        let system_url = resolve_system(system).to_string();

        let bundle = self.fhir.search("Condition", &[("patient", patient_id)]).await?;

        let mut related = Vec::new();
        for condition in bundle.into_resources() {
            if self
                .condition_is_related(&condition, parent_code, system, &system_url)
                .await
            {
                related.push(condition);
            }
        }

        if self.enrich_display {
            let mut enriched = Vec::with_capacity(related.len());
            for condition in related {
                enriched.push(self.enrich_codings(condition).await?);
            }
            return Ok(enriched);
        }
        Ok(related)
    }

    async fn condition_is_related(
        &self,
        condition: &Resource,
        parent_code: &str,
        system: &str,
        system_url: &str,
    ) -> bool {
        use crate::terminology::SubsumptionOutcome::{Equivalent, Subsumes};

        for (coding_system, code) in condition_codings(condition) {
            if coding_system != system_url {
                continue;
            }
            match self.terminology.check_subsumption(parent_code, &code, system).await {
                Ok(Subsumes | Equivalent) => return true,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        condition = condition.id().unwrap_or("unknown"),
                        code,
                        error = %e,
                        "Subsumption check failed, skipping condition"
                    );
                }
            }
        }
        false
    }

    /// Appends translated codings to a condition's code
    ///
    /// Each existing coding is translated toward `target_system`; matched
    /// concepts are appended alongside the originals so both vocabularies
    /// travel with the resource. Codes with no mapping are left alone, and
    /// failed translations are logged and skipped.
    pub async fn translate_condition_codes(
        &self,
        condition: Resource,
        target_system: &str,
    ) -> Result<Resource> {
        let existing = condition_codings(&condition);
        let mut value = condition.into_value();

        let mut additions: Vec<Value> = Vec::new();
        for (system, code) in &existing {
            match self
                .terminology
                .translate_code(code, system, target_system, None)
                .await
            {
                Ok(translation) if translation.matched => {
                    for matched in translation.matches {
                        if let Some(concept) = matched.concept {
                            let already_present = existing.iter().any(|(s, c)| {
                                Some(s.as_str()) == concept.system.as_deref()
                                    && Some(c.as_str()) == concept.code.as_deref()
                            });
                            if !already_present {
                                additions.push(serde_json::to_value(concept)?);
                            }
                        }
                    }
                }
                Ok(_) => {
                    tracing::debug!(code, system, target_system, "No translation available");
                }
                Err(e) => {
                    tracing::warn!(code, system, error = %e, "Translation failed, keeping original coding");
                }
            }
        }

        if !additions.is_empty() {
            if let Some(Value::Array(codings)) = value.pointer_mut("/code/coding") {
                codings.extend(additions);
            }
        }

        Resource::new(value)
    }

    /// Validates every coding in a resource
    ///
    /// Returns one message per invalid coding, labelled with its path in
    /// the resource; an empty list means everything checked out. Transport
    /// and server failures propagate rather than marking codes invalid.
    pub async fn validate_resource_codes(&self, resource: &Resource) -> Result<Vec<String>> {
        let mut occurrences = Vec::new();
        collect_coding_paths(resource.as_value(), String::new(), &mut occurrences);

        let unique: BTreeSet<(String, String)> = occurrences
            .iter()
            .map(|(_, system, code)| (system.clone(), code.clone()))
            .collect();
        let pairs: Vec<(String, String)> = unique.into_iter().collect();

        let checks = pairs
            .iter()
            .map(|(system, code)| self.terminology.is_valid_code(code, system));
        let results = join_all(checks).await;

        let mut verdicts = BTreeMap::new();
        for ((system, code), result) in pairs.into_iter().zip(results) {
            verdicts.insert((system, code), result?);
        }

        let mut errors = Vec::new();
        for (path, system, code) in occurrences {
            if let Some(false) = verdicts.get(&(system.clone(), code.clone())) {
                errors.push(format!("{path}: Invalid code '{code}' in system '{system}'"));
            }
        }
        Ok(errors)
    }

    /// Code and label pairs for a selection field, from a value set
    ///
    /// The label falls back to the code itself when the expansion carries
    /// no display.
    pub async fn value_set_options(&self, value_set_url: &str) -> Result<Vec<(String, String)>> {
        let expansion = self
            .terminology
            .expand_value_set(
                crate::terminology::ValueSetRef::Url(value_set_url),
                &crate::terminology::ExpandOptions::default(),
            )
            .await?;

        Ok(expansion
            .contains
            .into_iter()
            .filter_map(|entry| {
                let code = entry.code?;
                let label = entry.display.unwrap_or_else(|| code.clone());
                Some((code, label))
            })
            .collect())
    }

    async fn check_code(&self, code: &str, system: &str) -> Result<()> {
        if self.validate_codes && !self.terminology.is_valid_code(code, system).await? {
            return Err(RosettaError::validation(format!(
                "Invalid code '{code}' in system '{system}'"
            )));
        }
        Ok(())
    }

    /// Resolves the system and fetches the display to build a concept
    async fn coded_concept(&self, code: &str, system: &str) -> Result<CodeableConcept> {
        let display = self.terminology.get_display_name(system, code).await?;
        let system_url = resolve_system(system);

        let mut coding = Coding::new(system_url, code);
        if let Some(display) = &display {
            coding = coding.with_display(display);
        }
        Ok(CodeableConcept {
            coding: vec![coding],
            text: Some(display.unwrap_or_else(|| code.to_string())),
        })
    }
}

/// The (system, code) pairs on a condition's primary code
fn condition_codings(condition: &Resource) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(codings) = condition
        .as_value()
        .pointer("/code/coding")
        .and_then(Value::as_array)
    {
        for coding in codings {
            let system = coding.get("system").and_then(Value::as_str);
            let code = coding.get("code").and_then(Value::as_str);
            if let (Some(system), Some(code)) = (system, code) {
                pairs.push((system.to_string(), code.to_string()));
            }
        }
    }
    pairs
}

/// Collects distinct (system, code) pairs for codings with no display
fn collect_missing_displays(value: &Value, out: &mut BTreeSet<(String, String)>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(codings)) = map.get("coding") {
                for coding in codings {
                    let system = coding.get("system").and_then(Value::as_str);
                    let code = coding.get("code").and_then(Value::as_str);
                    let display = coding.get("display").and_then(Value::as_str);
                    if let (Some(system), Some(code)) = (system, code) {
                        if display.map_or(true, str::is_empty) {
                            out.insert((system.to_string(), code.to_string()));
                        }
                    }
                }
            }
            for child in map.values() {
                collect_missing_displays(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_missing_displays(item, out);
            }
        }
        _ => {}
    }
}

/// Patches fetched display names into the tree and fills container text
fn apply_displays(value: &mut Value, displays: &BTreeMap<(String, String), String>) {
    if let Value::Object(map) = value {
        if let Some(Value::Array(codings)) = map.get_mut("coding") {
            for coding in codings.iter_mut() {
                let system = coding.get("system").and_then(Value::as_str).map(str::to_string);
                let code = coding.get("code").and_then(Value::as_str).map(str::to_string);
                let missing = coding
                    .get("display")
                    .and_then(Value::as_str)
                    .map_or(true, str::is_empty);
                if let (Some(system), Some(code), true) = (system, code, missing) {
                    if let Some(display) = displays.get(&(system, code)) {
                        coding["display"] = Value::String(display.clone());
                    }
                }
            }
        }

        let has_text = map
            .get("text")
            .and_then(Value::as_str)
            .map_or(false, |text| !text.is_empty());
        if !has_text {
            let first_display = map
                .get("coding")
                .and_then(Value::as_array)
                .and_then(|codings| codings.first())
                .and_then(|coding| coding.get("display"))
                .and_then(Value::as_str)
                .map(str::to_string);
            if let Some(display) = first_display {
                map.insert("text".to_string(), Value::String(display));
            }
        }
    }

    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                apply_displays(child, displays);
            }
        }
        Value::Array(items) => {
            for item in items {
                apply_displays(item, displays);
            }
        }
        _ => {}
    }
}

/// Collects (path, system, code) for every coding in the tree
fn collect_coding_paths(value: &Value, path: String, out: &mut Vec<(String, String, String)>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(codings)) = map.get("coding") {
                for (index, coding) in codings.iter().enumerate() {
                    let system = coding.get("system").and_then(Value::as_str);
                    let code = coding.get("code").and_then(Value::as_str);
                    if let (Some(system), Some(code)) = (system, code) {
                        let label = if path.is_empty() {
                            format!("coding[{index}]")
                        } else {
                            format!("{path}.coding[{index}]")
                        };
                        out.push((label, system.to_string(), code.to_string()));
                    }
                }
            }
            for (key, child) in map {
                if key == "coding" {
                    continue;
                }
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                collect_coding_paths(child, child_path, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_coding_paths(item, format!("{path}[{index}]"), out);
            }
        }
        _ => {}
    }
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

    fn observation_json() -> Value {
        json!({
            "resourceType": "Observation",
            "status": "final",
            "code": {
                "coding": [
                    {"system": "http://loinc.org", "code": "29463-7"},
                    {"system": "http://loinc.org", "code": "8867-4", "display": "Heart rate"}
                ]
            },
            "category": [{
                "coding": [{"system": "http://terminology.hl7.org/CodeSystem/observation-category", "code": "vital-signs"}]
            }]
        })
    }

    #[test]
    fn test_collect_missing_displays_skips_populated_codings() {
        let mut targets = BTreeSet::new();
        collect_missing_displays(&observation_json(), &mut targets);

        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&("http://loinc.org".to_string(), "29463-7".to_string())));
        assert!(!targets.contains(&("http://loinc.org".to_string(), "8867-4".to_string())));
    }

    #[test]
    fn test_apply_displays_patches_and_fills_text() {
        let mut value = observation_json();
        let mut displays = BTreeMap::new();
        displays.insert(
            ("http://loinc.org".to_string(), "29463-7".to_string()),
            "Body weight".to_string(),
        );

        apply_displays(&mut value, &displays);

        assert_eq!(value["code"]["coding"][0]["display"], "Body weight");
        // untouched coding keeps its display
        assert_eq!(value["code"]["coding"][1]["display"], "Heart rate");
        // container text filled from the first coding
        assert_eq!(value["code"]["text"], "Body weight");
        // unknown pair stays display-less
        assert!(value["category"][0]["coding"][0].get("display").is_none());
    }

    #[test]
    fn test_apply_displays_keeps_existing_text() {
        let mut value = json!({
            "code": {
                "coding": [{"system": "s", "code": "c", "display": "better"}],
                "text": "original"
            }
        });
        apply_displays(&mut value, &BTreeMap::new());
        assert_eq!(value["code"]["text"], "original");
    }

    #[test]
    fn test_collect_coding_paths_labels_positions() {
        let mut out = Vec::new();
        collect_coding_paths(&observation_json(), String::new(), &mut out);

        let paths: Vec<&str> = out.iter().map(|(path, _, _)| path.as_str()).collect();
        assert!(paths.contains(&"code.coding[0]"));
        assert!(paths.contains(&"code.coding[1]"));
        assert!(paths.contains(&"category[0].coding[0]"));
    }

    #[test]
    fn test_condition_codings_reads_primary_code() {
        let condition = Resource::new(json!({
            "resourceType": "Condition",
            "code": {
                "coding": [
                    {"system": "http://hl7.org/fhir/sid/icd-10", "code": "I10"},
                    {"code": "display-only"}
                ]
            }
        }))
        .unwrap();

        let pairs = condition_codings(&condition);
        assert_eq!(
            pairs,
            vec![("http://hl7.org/fhir/sid/icd-10".to_string(), "I10".to_string())]
        );
    }
}
