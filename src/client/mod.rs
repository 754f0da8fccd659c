//! FHIR server client
//!
//! # Overview
//!
//! This module provides HTTP access to FHIR R4 servers:
//!
//! - [`HttpTransport`] - pooled HTTP session with basic auth, TLS control
//!   and bounded retry
//! - [`ResourceClient`] - resource CRUD and search on top of the transport
//! - [`Bundle`] - search result envelope
//!
//! The transport owns all retry behavior. Transient failures (connection
//! errors, timeouts, 5xx responses) are retried with exponential backoff up
//! to the configured attempt limit; 4xx responses are never retried.

pub mod models;
pub mod resource;
pub mod transport;

pub use models::{Bundle, BundleEntry, BundleLink};
pub use resource::ResourceClient;
pub use transport::{HttpTransport, TransportResponse};
