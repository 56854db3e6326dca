//! Error types for glucolink-store.

/// Result type for glucolink-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in glucolink-store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A required argument was absent or empty.
    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    /// The requested record has not been stored yet.
    #[error("Not found: {0}")]
    NotFound(&'static str),
}

impl Error {
    /// Whether this error means the store simply has no such record yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
