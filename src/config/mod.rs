//! Configuration management for Rosetta.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation for the two server endpoints Rosetta talks to.
//!
//! # Overview
//!
//! Rosetta uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Environment variable overrides (`ROSETTA_*` prefix)
//! - Default values for optional settings
//! - Comprehensive validation
//! - Type-safe configuration structs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rosetta::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from file
//! let config = load_config("rosetta.toml")?;
//!
//! // Access configuration sections
//! println!("FHIR server: {}", config.fhir.base_url);
//! println!("Terminology server: {}", config.terminology.base_url);
//! # Ok(())
//! # }
//! ```
//!
//! Clients can also be configured entirely in code, without a file:
//!
//! ```rust
//! use rosetta::config::ServerConfig;
//!
//! let config = ServerConfig::new("https://fhir.example.com/r4")
//!     .with_basic_auth("svc-rosetta", "s3cret")
//!     .with_timeout_seconds(10);
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Application settings (log level)
//! - [`ServerConfig`] - Server endpoint, credentials, TLS, timeout, retry;
//!   used for both the `[fhir]` and `[terminology]` sections
//! - [`RetryConfig`] - Attempt limit and backoff shape
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [fhir]
//! base_url = "https://hapi.fhir.org/baseR4"
//! username = "svc-rosetta"
//! password = "${ROSETTA_FHIR_PASSWORD}"
//! timeout_seconds = 30
//!
//! [terminology]
//! base_url = "https://tx.fhir.org/r4"
//!
//! [terminology.retry]
//! max_attempts = 3
//! initial_delay_ms = 1000
//! ```
//!
//! # Environment Variables
//!
//! Use `${VAR_NAME}` syntax for substitution inside the file, or the
//! `ROSETTA_<SECTION>_<KEY>` pattern to override values from the outside:
//!
//! ```bash
//! export ROSETTA_FHIR_PASSWORD="secret-password"
//! export ROSETTA_TERMINOLOGY_BASE_URL="https://tx.internal.example.com/r4"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default};
pub use schema::{
    ApplicationConfig, Environment, RetryConfig, RosettaConfig, ServerConfig,
    DEFAULT_FHIR_BASE_URL, DEFAULT_TERMINOLOGY_BASE_URL,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
