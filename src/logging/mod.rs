//! Logging and observability
//!
//! Structured logging via `tracing`, with console output and an optional
//! JSON line format.
//!
//! # Example
//!
//! ```no_run
//! use rosetta::logging::init_logging;
//!
//! init_logging("info", false).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

pub use structured::init_logging;

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use rosetta::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, 2000u64, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying request"
        );
    };
}
