//! HTTP client for the LibreLinkUp glucose telemetry API.
//!
//! This crate authenticates against LibreLinkUp, fetches the raw connection
//! and graph payloads, and classifies every failure into a typed [`Error`].
//!
//! # Features
//!
//! - **Login**: email/password authentication with derived `account-id`
//! - **Connections**: current measurement, sensor and reader snapshot
//! - **Graph**: ~12 hours of history for initial backfill
//! - **Cancellation**: every call honors a caller-supplied
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - **Typed failures**: network, auth, rate limit, server, HTTP, decode
//!
//! The client performs no retries and no backoff. Callers own the retry
//! policy; see [`Error::is_retryable`].
//!
//! # Quick Start
//!
//! ```no_run
//! use glucolink_core::{ClientOptions, Error, LinkUpClient};
//! use glucolink_types::current_measurement;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LinkUpClient::new(ClientOptions::default())?;
//!     let cancel = CancellationToken::new();
//!
//!     let session = client.authenticate("me@example.com", "secret", &cancel).await?;
//!     match client.connections(&session.token, &session.account_id, &cancel).await {
//!         Ok(resp) => println!("{}", current_measurement(&resp)?.render()),
//!         Err(Error::RateLimited { .. }) => eprintln!("slow down"),
//!         Err(e) => return Err(e.into()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;

pub use client::{
    ACCOUNT_ID_HEADER, AuthSession, ClientOptions, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
    LinkUpClient, account_id_for,
};
pub use error::{Error, NetworkError, Result};

// Re-export from glucolink-types
pub use glucolink_types::wire;
