//! Domain error types
//!
//! This module defines the error taxonomy for Rosetta. Every failure a client
//! can surface belongs to one of the variants below, carrying the originating
//! HTTP status where one exists. Errors are domain-specific and don't expose
//! third-party HTTP client types.

use thiserror::Error;

/// Main Rosetta error type
///
/// This is the primary error type used throughout the library. HTTP responses
/// are classified exactly once, by [`RosettaError::from_status`], so the
/// resource and terminology clients never interpret raw status codes
/// themselves.
#[derive(Debug, Error)]
pub enum RosettaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Network-level failures: connect, DNS, timeout
    #[error("Connection error: {0}")]
    Connection(String),

    /// Authentication rejected by the server (401/403)
    #[error("Authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// Resource not found (404)
    #[error("Resource not found ({status}): {message}")]
    ResourceNotFound { status: u16, message: String },

    /// Request rejected as invalid: other 4xx, or malformed caller input
    /// detected before any request is sent (no status in that case)
    #[error("Validation error: {message}")]
    Validation { status: Option<u16>, message: String },

    /// Server-side failure: 5xx after retries are exhausted, or any
    /// failure with no more specific classification
    #[error("Operation failed: {message}")]
    Operation { status: Option<u16>, message: String },

    /// Response shape violates the expected FHIR structure
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl RosettaError {
    /// Classifies an HTTP status code into a domain error
    ///
    /// 401/403 map to `Authentication`, 404 to `ResourceNotFound`, the rest
    /// of 4xx to `Validation`, and everything else (5xx and any status the
    /// transport could not make sense of) to `Operation`.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => RosettaError::Authentication { status, message },
            404 => RosettaError::ResourceNotFound { status, message },
            400..=499 => RosettaError::Validation {
                status: Some(status),
                message,
            },
            _ => RosettaError::Operation {
                status: Some(status),
                message,
            },
        }
    }

    /// Shorthand for a `Validation` error with no HTTP status
    ///
    /// Used for caller input rejected before any request is sent, e.g. an
    /// update on a resource without an `id`.
    pub fn validation(message: impl Into<String>) -> Self {
        RosettaError::Validation {
            status: None,
            message: message.into(),
        }
    }

    /// Returns the originating HTTP status, when the error has one
    pub fn status(&self) -> Option<u16> {
        match self {
            RosettaError::Authentication { status, .. }
            | RosettaError::ResourceNotFound { status, .. } => Some(*status),
            RosettaError::Validation { status, .. } | RosettaError::Operation { status, .. } => {
                *status
            }
            _ => None,
        }
    }

    /// Whether retrying the same call could succeed
    ///
    /// Only transport failures and server-side (5xx) failures are
    /// retryable. The transport already retries these up to its configured
    /// limit before they surface, so this is advisory for callers with their
    /// own scheduling.
    pub fn is_retryable(&self) -> bool {
        match self {
            RosettaError::Connection(_) => true,
            RosettaError::Operation { status, .. } => {
                matches!(status, Some(s) if *s >= 500)
            }
            _ => false,
        }
    }
}

// Conversion from serde_json::Error: a body that fails to serialize or parse
// is a protocol-level problem, not a caller mistake
impl From<serde_json::Error> for RosettaError {
    fn from(err: serde_json::Error) -> Self {
        RosettaError::Protocol(format!("JSON error: {err}"))
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RosettaError {
    fn from(err: toml::de::Error) -> Self {
        RosettaError::Configuration(format!("TOML parse error: {err}"))
    }
}
