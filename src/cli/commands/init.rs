//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "rosetta.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Rosetta configuration");
        println!();

        // Check if file already exists
        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your server URLs", self.output);
                println!("  2. For authenticated servers, uncomment username/password and");
                println!("     set ROSETTA_FHIR_USERNAME and ROSETTA_FHIR_PASSWORD in .env");
                println!("  3. Validate configuration: rosetta validate-config");
                println!("  4. Try it out: rosetta validate-code --code 29463-7 --system loinc");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate starter configuration
    fn generate_config() -> String {
        r#"# Rosetta Configuration File
# FHIR client and terminology tools
#
# Both servers default to public test instances. Point them at your own
# infrastructure before working with real data.

# Runtime environment (development, staging, production)
# TLS verification cannot be disabled in production.
environment = "development"

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# FHIR Resource Server
# ============================================================================
[fhir]
base_url = "https://hapi.fhir.org/baseR4"

# Basic authentication (omit both for open servers)
# username = "${ROSETTA_FHIR_USERNAME}"
# password = "${ROSETTA_FHIR_PASSWORD}"

tls_verify = true
timeout_seconds = 30

[fhir.retry]
max_attempts = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Terminology Server
# ============================================================================
[terminology]
base_url = "https://tx.fhir.org/r4"

# username = "${ROSETTA_TERMINOLOGY_USERNAME}"
# password = "${ROSETTA_TERMINOLOGY_PASSWORD}"

tls_verify = true
timeout_seconds = 30

[terminology.retry]
max_attempts = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0
"#
        .to_string()
    }
}
