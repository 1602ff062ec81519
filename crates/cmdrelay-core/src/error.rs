// Error types for relay input handling

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors raised while turning an inbound request into core input.
///
/// Log, registry and filter operations are total; only construction of a
/// submission or poll from untrusted fields can fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    /// A required field was absent or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field exceeded its size limit
    #[error("Field too large: {0}")]
    FieldTooLarge(&'static str),
}

impl RelayError {
    /// Create a missing field error
    pub fn missing(field: &'static str) -> Self {
        RelayError::MissingField(field)
    }

    /// Create a field size error
    pub fn too_large(field: &'static str) -> Self {
        RelayError::FieldTooLarge(field)
    }
}
