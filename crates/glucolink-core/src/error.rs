//! Error types for glucolink-core.
//!
//! Every failure of an API call maps to exactly one [`Error`] variant, chosen
//! in this order:
//!
//! | Condition | Variant |
//! |-----------|---------|
//! | No response received (DNS, connect, timeout, cancellation) | [`Error::Network`] |
//! | 2xx with a body that does not decode | [`Error::Decode`] |
//! | 401 | [`Error::Auth`] |
//! | 429 | [`Error::RateLimited`] |
//! | 5xx | [`Error::Server`] |
//! | any other non-2xx | [`Error::Http`] |
//!
//! The client never retries. [`Error::is_retryable`] tells the caller which
//! failures are worth another attempt; scheduling that attempt is up to them.

use thiserror::Error;

/// Errors that can occur when talking to the LibreLinkUp API.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Credentials or token rejected (HTTP 401).
    #[error("Authentication failed: {body}")]
    Auth {
        /// Raw response body.
        body: String,
    },

    /// Upstream asked us to slow down (HTTP 429).
    #[error("Rate limited: {body}")]
    RateLimited {
        /// Raw response body.
        body: String,
    },

    /// Upstream failed (HTTP 5xx).
    #[error("Server error {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Any other non-success status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A successful response whose body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid client configuration (base URL or header values).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why no response was received.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NetworkError {
    /// Transport failure reported by the HTTP stack, including timeouts.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// HTTP status of the response, if one was received and was not a success.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { .. } => Some(401),
            Error::RateLimited { .. } => Some(429),
            Error::Server { status, .. } | Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller may reasonably try the same call again later.
    ///
    /// Network failures (except explicit cancellation), rate limiting and
    /// server errors are transient. Auth, decode and other HTTP errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(NetworkError::Cancelled) => false,
            Error::Network(_) | Error::RateLimited { .. } | Error::Server { .. } => true,
            _ => false,
        }
    }

    /// Whether the session must be re-established before the next call.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(NetworkError::Transport(err))
    }
}

/// Result type alias using glucolink-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
