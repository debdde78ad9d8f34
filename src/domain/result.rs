//! Result type alias for svckit

use super::errors::SvckitError;

/// Result type alias for svckit operations
///
/// # Examples
///
/// ```
/// use svckit::domain::result::Result;
/// use svckit::domain::errors::SvckitError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(SvckitError::Plugin("not registered".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SvckitError>;
