//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RosettaConfig;
use super::{secret_string, ServerConfig};
use crate::domain::errors::RosettaError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into RosettaConfig
/// 4. Applies environment variable overrides (ROSETTA_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use rosetta::config::loader::load_config;
///
/// let config = load_config("rosetta.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RosettaConfig> {
    let path = path.as_ref();

    // Check if file exists
    if !path.exists() {
        return Err(RosettaError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    // Read file contents
    let contents = fs::read_to_string(path).map_err(|e| {
        RosettaError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: RosettaConfig = toml::from_str(&contents)
        .map_err(|e| RosettaError::Configuration(format!("Failed to parse TOML: {e}")))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config
        .validate()
        .map_err(|e| RosettaError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Loads configuration from a TOML file, falling back to defaults
///
/// Behaves like [`load_config`] when the file exists. When it does not, the
/// built-in defaults (the public HAPI and tx.fhir.org servers) are used, still
/// honoring `ROSETTA_*` environment overrides. This keeps the CLI usable with
/// no configuration file at all.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<RosettaConfig> {
    let path = path.as_ref();

    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(
        path = %path.display(),
        "Configuration file not found, using built-in defaults"
    );

    let mut config = RosettaConfig::default();
    apply_env_overrides(&mut config);
    config
        .validate()
        .map_err(|e| RosettaError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. All missing variables are collected into
/// a single error so the operator sees the complete list at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| RosettaError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines - don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RosettaError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the ROSETTA_* prefix
///
/// Variables follow the pattern ROSETTA_<SECTION>_<KEY>, e.g.
/// ROSETTA_FHIR_BASE_URL or ROSETTA_TERMINOLOGY_PASSWORD.
fn apply_env_overrides(config: &mut RosettaConfig) {
    if let Ok(val) = std::env::var("ROSETTA_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    apply_server_overrides(&mut config.fhir, "ROSETTA_FHIR");
    apply_server_overrides(&mut config.terminology, "ROSETTA_TERMINOLOGY");
}

fn apply_server_overrides(config: &mut ServerConfig, prefix: &str) {
    if let Ok(val) = std::env::var(format!("{prefix}_BASE_URL")) {
        config.base_url = val;
    }
    if let Ok(val) = std::env::var(format!("{prefix}_USERNAME")) {
        config.username = Some(val);
    }
    if let Ok(val) = std::env::var(format!("{prefix}_PASSWORD")) {
        config.password = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var(format!("{prefix}_TLS_VERIFY")) {
        config.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var(format!("{prefix}_TIMEOUT_SECONDS")) {
        if let Ok(timeout) = val.parse() {
            config.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var(format!("{prefix}_RETRY_MAX_ATTEMPTS")) {
        if let Ok(attempts) = val.parse() {
            config.retry.max_attempts = attempts;
        }
    }
}
