//! HTTP client for the LibreLinkUp API.
//!
//! The client is cheap to clone and holds no mutable state after
//! construction, so it can be shared freely across tasks.
//!
//! # Example
//!
//! ```no_run
//! use glucolink_core::{ClientOptions, LinkUpClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = LinkUpClient::new(ClientOptions::default())?;
//! let cancel = CancellationToken::new();
//!
//! let session = client.authenticate("me@example.com", "secret", &cancel).await?;
//! let connections = client
//!     .connections(&session.token, &session.account_id, &cancel)
//!     .await?;
//! println!("{} connection(s)", connections.data.len());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use glucolink_types::wire::{
    ConnectionsResponse, GraphResponse, LoginRequest, LoginResponse, UserData,
};

use crate::error::{Error, NetworkError, Result};

/// Production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.libreview.io";
/// Request timeout applied to every call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// App version the upstream expects in the `version` header.
pub const DEFAULT_VERSION: &str = "4.12.0";
/// Product tag the upstream expects in the `product` header.
pub const DEFAULT_PRODUCT: &str = "llu.android";
/// Browser-like user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 (KHTML, like Gecko) LibreLinkUp";

/// Header carrying the hashed user id on authenticated calls.
pub const ACCOUNT_ID_HEADER: &str = "account-id";

const LOGIN_PATH: &str = "/llu/auth/login";
const CONNECTIONS_PATH: &str = "/llu/connections";

/// Construction options for [`LinkUpClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub version: String,
    pub product: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            version: DEFAULT_VERSION.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
        }
    }
}

impl ClientOptions {
    /// Default options pointed at another endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of a successful login.
#[derive(Clone)]
pub struct AuthSession {
    /// Bearer token for subsequent calls.
    pub token: String,
    pub user_id: String,
    /// SHA-256 hex digest of `user_id`, sent as the `account-id` header.
    pub account_id: String,
    pub expires_at: Option<OffsetDateTime>,
    /// Profile of the account holder.
    pub user: UserData,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("account_id", &self.account_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Whether the token's advertised expiry has passed.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Derive the `account-id` header value from a user id.
///
/// ```
/// use glucolink_core::account_id_for;
///
/// assert_eq!(
///     account_id_for("abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
pub fn account_id_for(user_id: &str) -> String {
    format!("{:x}", Sha256::digest(user_id.as_bytes()))
}

/// Client for the LibreLinkUp API.
#[derive(Debug, Clone)]
pub struct LinkUpClient {
    client: Client,
    base_url: String,
}

impl LinkUpClient {
    /// Create a client with fixed identification headers and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the base URL is not http(s) or a
    /// header value contains invalid characters.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let base_url = normalize_base_url(&options.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("version"),
            header_value("version", &options.version)?,
        );
        headers.insert(
            HeaderName::from_static("product"),
            header_value("product", &options.product)?,
        );

        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(header_value("user-agent", &options.user_agent)?)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::invalid_config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Create a client with a custom reqwest Client.
    ///
    /// The caller is responsible for the identification headers and timeout.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in and derive the account id.
    ///
    /// Sent without auth headers.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<AuthSession> {
        let body = LoginRequest { email, password };
        let response: LoginResponse = self
            .request(Method::POST, LOGIN_PATH, "", "", Some(&body), cancel)
            .await?;

        let LoginResponse { data } = response;
        let account_id = account_id_for(&data.user.id);
        let expires_at = if data.auth_ticket.expires > 0 {
            OffsetDateTime::from_unix_timestamp(data.auth_ticket.expires).ok()
        } else {
            None
        };

        debug!(user_id = %data.user.id, "Authenticated");

        Ok(AuthSession {
            token: data.auth_ticket.token,
            user_id: data.user.id.clone(),
            account_id,
            expires_at,
            user: data.user,
        })
    }

    /// Current measurement plus patient and sensor snapshot for every connection.
    pub async fn connections(
        &self,
        token: &str,
        account_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ConnectionsResponse> {
        self.get(CONNECTIONS_PATH, token, account_id, cancel).await
    }

    /// Roughly twelve hours of history plus the current snapshot for one patient.
    pub async fn graph(
        &self,
        token: &str,
        account_id: &str,
        patient_id: &str,
        cancel: &CancellationToken,
    ) -> Result<GraphResponse> {
        let path = format!("{}/{}/graph", CONNECTIONS_PATH, patient_id);
        self.get(&path, token, account_id, cancel).await
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        account_id: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.request::<(), T>(Method::GET, path, token, account_id, None, cancel)
            .await
    }

    /// Shared request path for every call.
    ///
    /// Auth headers are attached only when both `token` and `account_id` are
    /// non-empty. Cancellation wins over an in-flight request.
    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        account_id: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method.clone(), &url);

        if let Some(body) = body {
            builder = builder.json(body);
        }
        if !token.is_empty() && !account_id.is_empty() {
            builder = builder
                .bearer_auth(token)
                .header(ACCOUNT_ID_HEADER, account_id);
        }

        debug!(%method, path, "Sending request");

        // The body read stays separate from `send()` so a status that has
        // already arrived is never reported as a transport failure.
        let exchange = async move {
            let response = builder.send().await?;
            let status = response.status();
            Ok::<_, reqwest::Error>((status, response.bytes().await))
        };

        let (status, body) = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(%method, path, "Request cancelled");
                return Err(Error::Network(NetworkError::Cancelled));
            }
            result = exchange => result.map_err(|e| {
                warn!(%method, path, error = %e, "Request failed before a response was received");
                Error::from(e)
            })?,
        };

        debug!(%method, path, status = status.as_u16(), "Received response");
        match body {
            Ok(bytes) => classify(status, &bytes),
            Err(e) if status.is_success() => {
                warn!(%method, path, error = %e, "Failed to read response body");
                Err(Error::from(e))
            }
            Err(e) => {
                debug!(%method, path, error = %e, "Error body truncated");
                classify(status, &[])
            }
        }
    }
}

/// Map a status and body to a decoded result or a typed error.
pub(crate) fn classify<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    if status.is_success() {
        return serde_json::from_slice(body).map_err(Error::Decode);
    }

    let body = String::from_utf8_lossy(body).into_owned();
    warn!(status = status.as_u16(), "Upstream returned an error status");

    Err(match status {
        StatusCode::UNAUTHORIZED => Error::Auth { body },
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited { body },
        s if s.is_server_error() => Error::Server {
            status: s.as_u16(),
            body,
        },
        s => Error::Http {
            status: s.as_u16(),
            body,
        },
    })
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    // Normalize URL (remove trailing slash)
    let base_url = base_url.trim_end_matches('/').to_string();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(Error::invalid_config(format!(
            "URL must start with http:// or https://, got: {}",
            base_url
        )));
    }

    Ok(base_url)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::invalid_config(format!("invalid value for header '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glucolink_types::wire::ConnectionsResponse;

    #[test]
    fn test_client_creation() {
        let client = LinkUpClient::new(ClientOptions::default()).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_normalizes_url() {
        let client =
            LinkUpClient::new(ClientOptions::with_base_url("http://localhost:8080/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = LinkUpClient::new(ClientOptions::with_base_url("localhost:8080"));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_client_invalid_header() {
        let options = ClientOptions {
            product: "bad\nvalue".to_string(),
            ..ClientOptions::default()
        };
        let result = LinkUpClient::new(options);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(ClientOptions::default().timeout, Duration::from_secs(30));
        let options = ClientOptions::default().timeout(Duration::from_secs(5));
        assert_eq!(options.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_account_id_is_sha256_hex() {
        let id = account_id_for("abc");
        assert_eq!(
            id,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(id.len(), 64);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = AuthSession {
            token: "super-secret".to_string(),
            user_id: "u".to_string(),
            account_id: account_id_for("u"),
            expires_at: None,
            user: UserData::default(),
        };
        let debug = format!("{:?}", session);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_session_expiry() {
        let now = OffsetDateTime::now_utc();
        let mut session = AuthSession {
            token: String::new(),
            user_id: String::new(),
            account_id: String::new(),
            expires_at: None,
            user: UserData::default(),
        };
        assert!(!session.is_expired(now));
        session.expires_at = Some(now - Duration::from_secs(1));
        assert!(session.is_expired(now));
    }

    #[test]
    fn test_classify_success() {
        let result: ConnectionsResponse = classify(StatusCode::OK, br#"{"data": []}"#).unwrap();
        assert!(result.data.is_empty());
    }

    #[test]
    fn test_classify_success_bad_body_is_decode() {
        let result: Result<ConnectionsResponse> = classify(StatusCode::OK, b"<html>");
        assert!(matches!(result, Err(Error::Decode(_))));

        let result: Result<ConnectionsResponse> = classify(StatusCode::OK, b"");
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_classify_statuses() {
        let cases = [
            (StatusCode::UNAUTHORIZED, "auth"),
            (StatusCode::TOO_MANY_REQUESTS, "rate"),
            (StatusCode::INTERNAL_SERVER_ERROR, "server"),
            (StatusCode::BAD_GATEWAY, "server"),
            (StatusCode::NOT_FOUND, "http"),
            (StatusCode::FORBIDDEN, "http"),
        ];
        for (status, expected) in cases {
            let err = classify::<ConnectionsResponse>(status, b"body").unwrap_err();
            let kind = match err {
                Error::Auth { .. } => "auth",
                Error::RateLimited { .. } => "rate",
                Error::Server { .. } => "server",
                Error::Http { .. } => "http",
                _ => "other",
            };
            assert_eq!(kind, expected, "status {}", status);
        }
    }

    #[test]
    fn test_classify_http_keeps_status_and_body() {
        let err = classify::<ConnectionsResponse>(StatusCode::IM_A_TEAPOT, b"short and stout")
            .unwrap_err();
        match err {
            Error::Http { status, body } => {
                assert_eq!(status, 418);
                assert_eq!(body, "short and stout");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
