//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Rosetta configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateConfigArgs {}

impl ValidateConfigArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config substitutes, parses and validates in one pass
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is not valid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!();
        println!("  FHIR Server: {}", config.fhir.base_url);
        println!("    Authentication: {}", auth_summary(&config.fhir));
        println!("    Timeout: {}s", config.fhir.timeout_seconds);
        println!("    Retry Attempts: {}", config.fhir.retry.max_attempts);
        println!();
        println!("  Terminology Server: {}", config.terminology.base_url);
        println!(
            "    Authentication: {}",
            auth_summary(&config.terminology)
        );
        println!("    Timeout: {}s", config.terminology.timeout_seconds);
        println!(
            "    Retry Attempts: {}",
            config.terminology.retry.max_attempts
        );
        println!();
        Ok(0)
    }
}

/// Describes a server's authentication without exposing credentials
fn auth_summary(config: &crate::config::ServerConfig) -> String {
    match &config.username {
        Some(username) => format!("basic ({username})"),
        None => "none".to_string(),
    }
}
