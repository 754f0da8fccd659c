//! Result type alias for Rosetta
//!
//! This module provides a convenient Result type alias that uses RosettaError
//! as the error type.

use super::errors::RosettaError;

/// Result type alias for Rosetta operations
///
/// This is a convenience type alias that uses `RosettaError` as the error
/// type. Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use rosetta::domain::result::Result;
/// use rosetta::domain::errors::RosettaError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(RosettaError::validation("Invalid input"))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RosettaError>;
