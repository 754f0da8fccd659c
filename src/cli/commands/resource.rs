//! Resource command implementations
//!
//! This module implements the `read`, `search`, `create`, `delete` and
//! `capabilities` commands against the configured FHIR server.

use crate::client::ResourceClient;
use crate::config::load_config_or_default;
use crate::domain::errors::RosettaError;
use crate::domain::resource::Resource;
use clap::Args;
use serde_json::Value;

/// Arguments for the read command
#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Resource type, e.g. Patient
    pub resource_type: String,

    /// Resource id
    pub id: String,
}

impl ReadArgs {
    /// Execute the read command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(resource_type = %self.resource_type, id = %self.id, "Reading resource");

        let client = match resource_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match client.read(&self.resource_type, &self.id).await {
            Ok(resource) => {
                println!("{}", serde_json::to_string_pretty(resource.as_value())?);
                Ok(0)
            }
            Err(RosettaError::ResourceNotFound { .. }) => {
                println!("❌ {}/{} not found", self.resource_type, self.id);
                Ok(1)
            }
            Err(e) => fatal("Read request failed", &e),
        }
    }
}

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Resource type to search, e.g. Patient
    pub resource_type: String,

    /// Search parameter as name=value (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Print the full search bundle as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    /// Execute the search command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(resource_type = %self.resource_type, params = ?self.params, "Searching");

        let mut params: Vec<(&str, &str)> = Vec::with_capacity(self.params.len());
        for raw in &self.params {
            match raw.split_once('=') {
                Some((name, value)) => params.push((name, value)),
                None => {
                    println!("❌ Invalid search parameter '{raw}', expected name=value");
                    return Ok(2);
                }
            }
        }

        let client = match resource_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match client.search(&self.resource_type, &params).await {
            Ok(bundle) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&bundle)?);
                    return Ok(0);
                }

                println!("Found {} resource(s)", bundle.total());
                if !bundle.is_empty() {
                    println!();
                    for resource in bundle.resources() {
                        match resource.reference() {
                            Some(reference) => println!("  - {reference}"),
                            None => println!("  - {} (no id)", resource.resource_type()),
                        }
                    }
                }
                Ok(0)
            }
            Err(e) => fatal("Search request failed", &e),
        }
    }
}

/// Arguments for the create command
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Path to a JSON resource file, or - for stdin
    #[arg(short, long)]
    pub file: String,
}

impl CreateArgs {
    /// Execute the create command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(file = %self.file, "Creating resource from file");

        let raw = if self.file == "-" {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            match std::fs::read_to_string(&self.file) {
                Ok(raw) => raw,
                Err(e) => {
                    println!("❌ Failed to read resource file: {}", self.file);
                    println!("   Error: {e}");
                    return Ok(2);
                }
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                println!("❌ Resource file is not valid JSON");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let resource = match Resource::new(value) {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Resource file is not a FHIR resource");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let client = match resource_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match client.create(&resource).await {
            Ok(created) => {
                match created.reference() {
                    Some(reference) => println!("✅ Created {reference}"),
                    None => println!("✅ Created {}", created.resource_type()),
                }
                Ok(0)
            }
            Err(e @ RosettaError::Validation { .. }) => {
                println!("❌ Server rejected the resource");
                println!("   Error: {e}");
                Ok(1)
            }
            Err(e) => fatal("Create request failed", &e),
        }
    }
}

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Resource type, e.g. Patient
    pub resource_type: String,

    /// Resource id
    pub id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl DeleteArgs {
    /// Execute the delete command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(resource_type = %self.resource_type, id = %self.id, "Deleting resource");

        let client = match resource_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        if !self.yes {
            print!(
                "Delete {}/{} from {}? [y/N]: ",
                self.resource_type,
                self.id,
                client.base_url()
            );
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Delete cancelled.");
                return Ok(0);
            }
        }

        match client.delete(&self.resource_type, &self.id).await {
            Ok(_) => {
                println!("✅ Deleted {}/{}", self.resource_type, self.id);
                Ok(0)
            }
            Err(RosettaError::ResourceNotFound { .. }) => {
                println!("❌ {}/{} not found", self.resource_type, self.id);
                Ok(1)
            }
            Err(e) => fatal("Delete request failed", &e),
        }
    }
}

/// Arguments for the capabilities command
#[derive(Args, Debug)]
pub struct CapabilitiesArgs {
    /// Print the full CapabilityStatement as JSON
    #[arg(long)]
    pub json: bool,
}

impl CapabilitiesArgs {
    /// Execute the capabilities command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Fetching capability statement");

        let client = match resource_client(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        match client.capability_statement().await {
            Ok(statement) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(statement.as_value())?);
                    return Ok(0);
                }

                let value = statement.as_value();
                let software = value
                    .pointer("/software/name")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let version = value
                    .pointer("/software/version")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let fhir_version = value
                    .get("fhirVersion")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let resource_types = value
                    .pointer("/rest/0/resource")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);

                println!("✅ Server: {software} {version}");
                println!("   Base URL: {}", client.base_url());
                println!("   FHIR version: {fhir_version}");
                println!("   Resource types supported: {resource_types}");
                Ok(0)
            }
            Err(e) => fatal("Capability request failed", &e),
        }
    }
}

/// Builds a resource client from configuration
///
/// Prints the failure and returns the exit code when the configuration
/// cannot be loaded or the client cannot be built.
fn resource_client(config_path: &str) -> Result<ResourceClient, i32> {
    let config = match load_config_or_default(config_path) {
        Ok(c) => c,
        Err(e) => {
            println!("❌ Failed to load configuration file");
            println!("   Error: {e}");
            return Err(2);
        }
    };

    match ResourceClient::new(&config.fhir) {
        Ok(client) => Ok(client),
        Err(e) => {
            println!("❌ Failed to initialize FHIR client");
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
