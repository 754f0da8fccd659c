// Rosetta - FHIR Client and Terminology Tools
// Copyright (c) 2025 Rosetta Contributors
// Licensed under the MIT License

//! # Rosetta - FHIR Client and Terminology Tools
//!
//! Rosetta is a FHIR R4 client library and CLI built in Rust, focused on
//! clinical terminology: validating codes, looking up display names,
//! expanding value sets, translating between code systems and testing
//! subsumption, alongside plain resource CRUD.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Resource operations** - create, read, update, delete and search FHIR resources
//! - **Terminology operations** - `$validate-code`, `$lookup`, `$expand`, `$translate`, `$subsumes`
//! - **Code system aliases** - write `loinc` or `snomed` instead of full system URLs
//! - **Integrated workflows** - validate-before-create and display enrichment
//!
//! ## Architecture
//!
//! Rosetta follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`integrated`] - Combined resource and terminology workflows
//! - [`client`] - HTTP transport and FHIR resource operations
//! - [`terminology`] - Terminology server operations
//! - [`models`] - Builders for common clinical resources
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rosetta::config::ServerConfig;
//! use rosetta::terminology::TerminologyClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("https://tx.fhir.org/r4");
//!     let client = TerminologyClient::new(&config)?;
//!
//!     // "loinc" resolves to http://loinc.org
//!     if client.is_valid_code("29463-7", "loinc").await? {
//!         let display = client.get_display_name("loinc", "29463-7").await?;
//!         println!("29463-7 = {}", display.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! ### Code System Aliases
//!
//! Common code systems resolve from short names; anything unrecognized
//! passes through verbatim, so full URLs always work:
//!
//! ```rust
//! use rosetta::terminology::resolve_system;
//!
//! assert_eq!(resolve_system("snomed"), "http://snomed.info/sct");
//! assert_eq!(resolve_system("loinc"), "http://loinc.org");
//! assert_eq!(resolve_system("http://example.org/custom"), "http://example.org/custom");
//! ```
//!
//! ### Resource CRUD
//!
//! ```rust,no_run
//! use rosetta::client::ResourceClient;
//! use rosetta::config::ServerConfig;
//!
//! # async fn example() -> rosetta::domain::Result<()> {
//! let client = ResourceClient::new(&ServerConfig::new("https://hapi.fhir.org/baseR4"))?;
//!
//! let patient = client.read("Patient", "example").await?;
//! println!("Found {patient}");
//!
//! let bundle = client.search("Observation", &[("patient", "example")]).await?;
//! println!("{} observation(s)", bundle.total());
//! # Ok(())
//! # }
//! ```
//!
//! ### Integrated Workflows
//!
//! [`integrated::IntegratedClient`] pairs both servers so codes are
//! validated before resources are stored and display names are filled in
//! when they come back:
//!
//! ```rust,no_run
//! use rosetta::config::RosettaConfig;
//! use rosetta::integrated::IntegratedClient;
//!
//! # async fn example() -> rosetta::domain::Result<()> {
//! let client = IntegratedClient::new(&RosettaConfig::default())?;
//! let observation = client
//!     .create_observation("123", "29463-7", "loinc", 70.5, "kg")
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Rosetta uses the [`domain::RosettaError`] type for all errors. Variants
//! separate connection failures, authentication problems, missing
//! resources, client-side rejections and server faults, so callers can
//! match on what actually went wrong:
//!
//! ```rust,no_run
//! use rosetta::domain::RosettaError;
//! # use rosetta::client::ResourceClient;
//!
//! # async fn example(client: &ResourceClient) {
//! match client.read("Patient", "missing").await {
//!     Ok(patient) => println!("Found {patient}"),
//!     Err(RosettaError::ResourceNotFound { status, message }) => {
//!         eprintln!("{status}: {message}");
//!     }
//!     Err(e) => eprintln!("Request failed: {e}"),
//! }
//! # }
//! ```
//!
//! ## Logging
//!
//! Rosetta uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn, error};
//!
//! info!(system = "loinc", code = "29463-7", "Validating code");
//! warn!(attempt = 2, "Retrying request");
//! error!(error = "timeout", "Request failed");
//! ```
//!
//! ## See Also
//!
//! - [FHIR Terminology Service](http://hl7.org/fhir/R4/terminology-service.html)
//! - [FHIR RESTful API](http://hl7.org/fhir/R4/http.html)

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod integrated;
pub mod logging;
pub mod models;
pub mod terminology;
