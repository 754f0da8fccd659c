//! Configuration schema types
//!
//! This module defines the configuration structure for Rosetta. Both FHIR
//! endpoints (resource server and terminology server) share one
//! [`ServerConfig`] shape; section names in validation messages tell them
//! apart.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default public resource server (HAPI FHIR R4 test instance)
pub const DEFAULT_FHIR_BASE_URL: &str = "https://hapi.fhir.org/baseR4";

/// Default public terminology server
pub const DEFAULT_TERMINOLOGY_BASE_URL: &str = "https://tx.fhir.org/r4";

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main Rosetta configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosettaConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// FHIR resource server configuration
    pub fhir: ServerConfig,

    /// Terminology server configuration
    pub terminology: ServerConfig,
}

impl RosettaConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.fhir.validate(&self.environment, "fhir")?;
        self.terminology.validate(&self.environment, "terminology")?;
        Ok(())
    }
}

impl Default for RosettaConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            environment: Environment::default(),
            fhir: ServerConfig::new(DEFAULT_FHIR_BASE_URL),
            terminology: ServerConfig::new(DEFAULT_TERMINOLOGY_BASE_URL),
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Retry configuration
///
/// `max_attempts` counts total HTTP calls, so `max_attempts = 3` means one
/// initial call plus at most two retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err(format!("{section}.retry.max_attempts must be >= 1"));
        }

        if self.max_attempts > 10 {
            return Err(format!(
                "{section}.retry.max_attempts must be <= 10, got {}",
                self.max_attempts
            ));
        }

        if self.initial_delay_ms > self.max_delay_ms {
            return Err(format!(
                "{section}.retry.initial_delay_ms ({}) cannot exceed max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            ));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "{section}.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// FHIR server endpoint configuration
///
/// Used for both the resource server and the terminology server. Values are
/// immutable once a client has been constructed from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server, e.g. `https://hapi.fhir.org/baseR4`
    pub base_url: String,

    /// Username for basic authentication (optional)
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication (optional)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// TLS certificate verification enabled
    ///
    /// **SECURITY WARNING**: Disabling TLS verification (setting to `false`)
    /// exposes the application to man-in-the-middle attacks and should ONLY
    /// be used in development/testing environments. In **production**
    /// environments this MUST be `true` (enforced by validation).
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ServerConfig {
    /// Creates a configuration for an unauthenticated server with defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            tls_verify: true,
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }

    /// Sets basic-auth credentials
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(crate::config::secret_string(password.into()));
        self
    }

    /// Sets the request timeout
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Sets the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn validate(&self, environment: &Environment, section: &str) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err(format!("{section}.base_url cannot be empty"));
        }

        match Url::parse(&self.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(format!(
                    "{section}.base_url must use http or https, got '{}'",
                    url.scheme()
                ));
            }
            Err(e) => {
                return Err(format!("{section}.base_url is not a valid URL: {e}"));
            }
        }

        // Basic auth needs both halves of the pair
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                if username.is_empty() {
                    return Err(format!("{section}.username cannot be empty"));
                }
                if password.expose_secret().is_empty() {
                    return Err(format!("{section}.password cannot be empty"));
                }
            }
            (Some(_), None) => {
                return Err(format!(
                    "{section}.username is set but {section}.password is missing"
                ));
            }
            (None, Some(_)) => {
                return Err(format!(
                    "{section}.password is set but {section}.username is missing"
                ));
            }
            (None, None) => {}
        }

        if self.timeout_seconds == 0 {
            return Err(format!("{section}.timeout_seconds must be > 0"));
        }

        // Security: Enforce TLS verification in production environments
        if *environment == Environment::Production && !self.tls_verify {
            return Err(format!(
                "TLS certificate verification cannot be disabled in production environments. \
                Set '{section}.tls_verify = true', or set 'environment = \"development\"' \
                for local testing against servers with self-signed certificates."
            ));
        }

        self.retry.validate(section)?;
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}
