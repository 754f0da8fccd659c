//! Terminology services
//!
//! # Overview
//!
//! Everything for working with FHIR terminology servers:
//!
//! - [`TerminologyClient`] - validation, lookup, expansion, translation and
//!   subsumption operations
//! - [`Parameters`] - typed envelope for operation requests and responses
//! - [`resolve_system`] - code system alias resolution
//!
//! Public terminology servers this module is routinely pointed at include
//! `https://tx.fhir.org/r4` (HL7) and SNOMED's Snowstorm instances.

pub mod client;
pub mod models;
pub mod systems;

pub use client::{ExpandOptions, TerminologyClient, ValueSetRef, DEFAULT_SEARCH_LIMIT};
pub use models::{
    ConceptMatch, ExpansionContains, Parameter, ParameterValue, Parameters, SubsumptionOutcome,
    Translation, ValidationOutcome, ValueSetExpansion,
};
pub use systems::{known_aliases, resolve_system};
