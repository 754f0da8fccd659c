//! Structured logging setup using tracing
//!
//! Console logging with configurable level and an optional JSON format for
//! machine-read pipelines. Log lines go to stderr so command output on
//! stdout stays clean.
//!
//! # Example
//!
//! ```no_run
//! use rosetta::logging::init_logging;
//!
//! init_logging("info", false).expect("Failed to initialize logging");
//! ```

use crate::domain::errors::RosettaError;
use crate::domain::result::Result;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize the logging system
///
/// Sets up a console subscriber filtered to `rosetta=<level>` unless
/// `RUST_LOG` overrides it. With `json` set, log lines are emitted as JSON
/// objects instead of human-readable text.
///
/// # Arguments
///
/// * `log_level` - Log level as a string (trace, debug, info, warn, error)
/// * `json` - Emit JSON-formatted log lines
///
/// # Errors
///
/// Returns [`RosettaError::Configuration`] for an unrecognized level.
pub fn init_logging(log_level: &str, json: bool) -> Result<()> {
    let level = parse_log_level(log_level)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rosetta={level}")));

    if json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter);
        tracing_subscriber::registry().with(layer).init();
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter);
        tracing_subscriber::registry().with(layer).init();
    }

    Ok(())
}

/// Parse log level from string
fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(RosettaError::Configuration(format!(
            "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
            level_str
        ))),
    }
}
