//! Terminology command implementations
//!
//! This module implements the `validate-code`, `lookup`, `expand`,
//! `translate` and `subsumes` commands against the configured terminology
//! server.

use crate::config::load_config_or_default;
use crate::domain::errors::RosettaError;
use crate::terminology::{
    resolve_system, ExpandOptions, TerminologyClient, ValidationOutcome, ValueSetRef,
};
use clap::{ArgGroup, Args};

/// Arguments for the validate-code command
#[derive(Args, Debug)]
pub struct ValidateCodeArgs {
    /// Code to validate, e.g. 29463-7
    #[arg(long)]
    pub code: String,

    /// Code system alias or URL, e.g. loinc
    #[arg(long)]
    pub system: String,

    /// Display name to check along with the code
    #[arg(long)]
    pub display: Option<String>,

    /// Validate membership in this value set instead of the code system
    #[arg(long, value_name = "URL")]
    pub value_set: Option<String>,
}

impl ValidateCodeArgs {
    /// Execute the validate-code command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(code = %self.code, system = %self.system, "Validating code");

        let client = match terminology_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let response = client
            .validate_code(
                &self.code,
                &self.system,
                self.display.as_deref(),
                self.value_set.as_deref(),
            )
            .await;

        match response {
            Ok(parameters) => {
                let outcome = ValidationOutcome::from_parameters(&parameters);
                if outcome.valid {
                    match &outcome.display {
                        Some(display) => println!("✅ Code '{}' is valid: {display}", self.code),
                        None => println!("✅ Code '{}' is valid", self.code),
                    }
                    Ok(0)
                } else {
                    match &self.value_set {
                        Some(url) => println!(
                            "❌ Code '{}' is not in value set {url}",
                            self.code
                        ),
                        None => println!(
                            "❌ Code '{}' is not valid in system '{}'",
                            self.code,
                            resolve_system(&self.system)
                        ),
                    }
                    Ok(1)
                }
            }
            Err(e) => fatal("Validation request failed", &e),
        }
    }
}

/// Arguments for the lookup command
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Code system alias or URL, e.g. snomed
    #[arg(long)]
    pub system: String,

    /// Code to look up, e.g. 38341003
    #[arg(long)]
    pub code: String,

    /// Property to request (repeatable)
    #[arg(long = "property", value_name = "NAME")]
    pub properties: Vec<String>,

    /// Print the full Parameters response as JSON
    #[arg(long)]
    pub json: bool,
}

impl LookupArgs {
    /// Execute the lookup command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(system = %self.system, code = %self.code, "Looking up code");

        let client = match terminology_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let properties: Vec<&str> = self.properties.iter().map(String::as_str).collect();
        match client.lookup_code(&self.system, &self.code, &properties).await {
            Ok(parameters) => {
                let display = parameters.string("display").unwrap_or("(no display)");
                let name = parameters.string("name").unwrap_or("(unnamed system)");
                println!("✅ {}: {display}", self.code);
                println!("   System: {name}");

                if self.json {
                    println!("{}", serde_json::to_string_pretty(&parameters)?);
                }
                Ok(0)
            }
            Err(RosettaError::ResourceNotFound { .. }) => {
                println!(
                    "❌ Code '{}' not found in system '{}'",
                    self.code,
                    resolve_system(&self.system)
                );
                Ok(1)
            }
            Err(e) => fatal("Lookup request failed", &e),
        }
    }
}

/// Arguments for the expand command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("value_set").required(true).multiple(false)))]
pub struct ExpandArgs {
    /// Canonical URL of the value set
    #[arg(long, group = "value_set")]
    pub url: Option<String>,

    /// Server-local ValueSet resource id
    #[arg(long, group = "value_set")]
    pub id: Option<String>,

    /// Text filter applied to the expansion
    #[arg(long)]
    pub filter: Option<String>,

    /// Number of codes to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Maximum number of codes to return
    #[arg(long, default_value_t = 100)]
    pub count: u64,
}

impl ExpandArgs {
    /// Execute the expand command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(url = ?self.url, id = ?self.id, "Expanding value set");

        let client = match terminology_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        // clap's argument group guarantees exactly one is present
        let target = match (&self.url, &self.id) {
            (Some(url), _) => ValueSetRef::Url(url),
            (_, Some(id)) => ValueSetRef::Id(id),
            (None, None) => unreachable!("clap enforces the value_set group"),
        };

        let options = ExpandOptions {
            filter: self.filter.clone(),
            offset: self.offset,
            count: self.count,
        };

        match client.expand_value_set(target, &options).await {
            Ok(expansion) => {
                match expansion.total {
                    Some(total) => println!(
                        "Found {total} code(s), showing {}:",
                        expansion.contains.len()
                    ),
                    None => println!("Found {} code(s):", expansion.contains.len()),
                }
                println!();
                for entry in &expansion.contains {
                    println!(
                        "  {:<20} {}",
                        entry.code.as_deref().unwrap_or("-"),
                        entry.display.as_deref().unwrap_or("")
                    );
                }
                Ok(0)
            }
            Err(RosettaError::ResourceNotFound { .. }) => {
                println!("❌ Value set not found: {target}");
                Ok(1)
            }
            Err(e) => fatal("Expansion request failed", &e),
        }
    }
}

/// Arguments for the translate command
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Code to translate
    #[arg(long)]
    pub code: String,

    /// Source code system alias or URL
    #[arg(long)]
    pub system: String,

    /// Target code system alias or URL
    #[arg(long)]
    pub target: String,

    /// Canonical URL of a specific concept map to use
    #[arg(long, value_name = "URL")]
    pub concept_map: Option<String>,
}

impl TranslateArgs {
    /// Execute the translate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(
            code = %self.code,
            source = %self.system,
            target = %self.target,
            "Translating code"
        );

        let client = match terminology_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let translation = client
            .translate_code(
                &self.code,
                &self.system,
                &self.target,
                self.concept_map.as_deref(),
            )
            .await;

        match translation {
            Ok(translation) if translation.matched => {
                println!("✅ Found {} mapping(s):", translation.matches.len());
                println!();
                for matched in &translation.matches {
                    let equivalence = matched.equivalence.as_deref().unwrap_or("related");
                    match &matched.concept {
                        Some(concept) => println!("  [{equivalence}] {concept}"),
                        None => println!("  [{equivalence}] (no concept returned)"),
                    }
                }
                Ok(0)
            }
            Ok(_) => {
                println!(
                    "❌ No mapping from '{}' to '{}'",
                    self.code,
                    resolve_system(&self.target)
                );
                Ok(1)
            }
            Err(e) => fatal("Translation request failed", &e),
        }
    }
}

/// Arguments for the subsumes command
#[derive(Args, Debug)]
pub struct SubsumesArgs {
    /// Candidate parent code
    #[arg(long)]
    pub code_a: String,

    /// Candidate child code
    #[arg(long)]
    pub code_b: String,

    /// Code system alias or URL both codes belong to
    #[arg(long)]
    pub system: String,
}

impl SubsumesArgs {
    /// Execute the subsumes command
    ///
    /// Exits 0 when the codes are related (equivalent, subsumes or
    /// subsumed-by) and 1 when they are not.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        use crate::terminology::SubsumptionOutcome::NotSubsumed;

        tracing::info!(
            code_a = %self.code_a,
            code_b = %self.code_b,
            system = %self.system,
            "Checking subsumption"
        );

        let client = match terminology_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match client
            .check_subsumption(&self.code_a, &self.code_b, &self.system)
            .await
        {
            Ok(NotSubsumed) => {
                println!("❌ '{}' and '{}' are not related", self.code_a, self.code_b);
                Ok(1)
            }
            Ok(outcome) => {
                println!("✅ Outcome: {outcome}");
                Ok(0)
            }
            Err(e) => fatal("Subsumption request failed", &e),
        }
    }
}

/// Builds a terminology client from configuration
///
/// Prints the failure and returns the exit code when the configuration
/// cannot be loaded or the client cannot be built.
fn terminology_client(config_path: &str) -> Result<TerminologyClient, i32> {
    let config = match load_config_or_default(config_path) {
        Ok(c) => c,
        Err(e) => {
            println!("❌ Failed to load configuration file");
            println!("   Error: {e}");
            return Err(2);
        }
    };

    match TerminologyClient::new(&config.terminology) {
        Ok(client) => Ok(client),
        Err(e) => {
            println!("❌ Failed to initialize terminology client");
            println!("   Error: {e}");
            Err(2)
        }
    }
}

/// Reports an unrecoverable request failure
fn fatal(context: &str, error: &RosettaError) -> anyhow::Result<i32> {
    tracing::error!(error = %error, "{context}");
    println!("❌ {context}");
    println!("   Error: {error}");
    Ok(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code_args_defaults() {
        let args = ValidateCodeArgs {
            code: "29463-7".to_string(),
            system: "loinc".to_string(),
            display: None,
            value_set: None,
        };

        assert_eq!(args.code, "29463-7");
        assert!(args.display.is_none());
        assert!(args.value_set.is_none());
    }

    #[test]
    fn test_lookup_args_with_properties() {
        let args = LookupArgs {
            system: "snomed".to_string(),
            code: "38341003".to_string(),
            properties: vec!["inactive".to_string(), "parent".to_string()],
            json: false,
        };

        assert_eq!(args.properties.len(), 2);
    }

    #[test]
    fn test_expand_args_defaults() {
        let args = ExpandArgs {
            url: Some("http://hl7.org/fhir/ValueSet/administrative-gender".to_string()),
            id: None,
            filter: None,
            offset: 0,
            count: 100,
        };

        assert_eq!(args.offset, 0);
        assert_eq!(args.count, 100);
    }
}
