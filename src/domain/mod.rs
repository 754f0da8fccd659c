//! Domain models and types for Rosetta.
//!
//! This module contains the core domain models, types, and error taxonomy
//! shared by the resource and terminology clients.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **The opaque resource model** ([`Resource`])
//! - **Terminology datatypes** ([`Coding`], [`CodeableConcept`])
//! - **The error taxonomy** ([`RosettaError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, RosettaError>`]. HTTP failures
//! are classified exactly once into the taxonomy, so callers match on error
//! kinds rather than status codes:
//!
//! ```rust
//! use rosetta::domain::{Resource, RosettaError, Result};
//!
//! fn describe(outcome: Result<Resource>) -> String {
//!     match outcome {
//!         Ok(resource) => format!("got {resource}"),
//!         Err(RosettaError::ResourceNotFound { .. }) => "absent".to_string(),
//!         Err(other) => format!("failed: {other}"),
//!     }
//! }
//! ```

pub mod coding;
pub mod errors;
pub mod resource;
pub mod result;

// Re-export commonly used types for convenience
pub use coding::{CodeableConcept, Coding};
pub use errors::RosettaError;
pub use resource::Resource;
pub use result::Result;
