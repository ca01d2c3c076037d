//! Caller-declared API version handling.

use crate::error::ApiVersionError;

/// The only API version this service implements.
pub const API_VERSION: &str = "v1";

/// Reject requests that ask for an API version other than [`API_VERSION`].
///
/// An empty string means the caller did not specify a version and is accepted.
pub fn check_version(requested: &str) -> Result<(), ApiVersionError> {
    if requested.is_empty() || requested == API_VERSION {
        return Ok(());
    }

    Err(ApiVersionError::Unsupported {
        supported: API_VERSION,
        requested: requested.to_string(),
    })
}
