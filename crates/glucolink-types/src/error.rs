//! Error types for timestamp and payload parsing in glucolink-types.

use thiserror::Error;

/// Errors that can occur when parsing a vendor timestamp.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The timestamp string was empty.
    #[error("Empty timestamp")]
    Empty,

    /// The timestamp did not match the `M/D/YYYY h:mm:ss AM|PM` layout.
    #[error("Invalid timestamp '{input}': {source}")]
    InvalidFormat {
        /// The rejected input.
        input: String,
        #[source]
        source: time::error::Parse,
    },
}

/// Result type alias using glucolink-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors that can occur when turning an API payload into measurements.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PayloadError {
    /// The payload was not valid JSON or did not have the expected shape.
    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload was well formed but held no connection entries.
    #[error("Payload contains no connections")]
    EmptyResult,

    /// A timestamp inside the payload could not be parsed.
    #[error(transparent)]
    Timestamp(#[from] ParseError),

    /// A numeric field was outside the representable range.
    #[error("Field '{field}' out of range: {source}")]
    OutOfRange {
        /// Wire name of the offending field.
        field: &'static str,
        #[source]
        source: time::error::ComponentRange,
    },
}

impl PayloadError {
    /// Whether this error means the account simply has no data yet.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, PayloadError::EmptyResult)
    }
}

/// Result type alias using glucolink-types' PayloadError type.
pub type PayloadResult<T> = std::result::Result<T, PayloadError>;
