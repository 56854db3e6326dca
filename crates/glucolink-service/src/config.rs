//! Service configuration.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use glucolink_core::ClientOptions;
use glucolink_core::client::{DEFAULT_BASE_URL, DEFAULT_PRODUCT, DEFAULT_USER_AGENT, DEFAULT_VERSION};

/// Service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Upstream API settings.
    pub api: ApiConfig,
    /// LibreLinkUp account credentials.
    pub account: AccountConfig,
    /// Background collector settings.
    pub collector: CollectorConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file yields the defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return every problem at once.
    ///
    /// Credentials are only required while the collector is enabled.
    ///
    /// # Example
    ///
    /// ```
    /// use glucolink_service::Config;
    ///
    /// let mut config = Config::default();
    /// config.collector.enabled = false;
    /// config.validate().expect("API-only defaults should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.api.validate());
        errors.extend(self.collector.validate());
        if self.collector.enabled {
            errors.extend(self.account.validate());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Bind a listener on [`bind`](Self::bind).
    ///
    /// Host names such as `localhost` are resolved here, so anything that
    /// passes [`validate`](Self::validate) can be bound.
    pub async fn bind_listener(&self) -> std::io::Result<tokio::net::TcpListener> {
        tokio::net::TcpListener::bind(self.bind.as_str()).await
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError::new(
                "server.bind",
                "bind address cannot be empty",
            ));
            return errors;
        }

        match self.bind.rsplit_once(':') {
            None => errors.push(ValidationError::new(
                "server.bind",
                format!(
                    "invalid bind address '{}': expected format 'host:port'",
                    self.bind
                ),
            )),
            Some((_, port)) => match port.parse::<u16>() {
                Ok(0) => errors.push(ValidationError::new("server.bind", "port cannot be 0")),
                Ok(_) => {}
                Err(_) => errors.push(ValidationError::new(
                    "server.bind",
                    format!("invalid port '{}': must be a number 1-65535", port),
                )),
            },
        }

        errors
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Regional endpoint, e.g. `https://api-eu.libreview.io`.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Value of the `version` header.
    pub version: String,
    /// Value of the `product` header.
    pub product: String,
    pub user_agent: String,
}

/// Maximum request timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            version: DEFAULT_VERSION.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            errors.push(ValidationError::new(
                "api.base_url",
                format!("'{}' must start with http:// or https://", self.base_url),
            ));
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::new(
                "api.timeout_secs",
                format!(
                    "timeout {} is out of range (1-{} seconds)",
                    self.timeout_secs, MAX_TIMEOUT_SECS
                ),
            ));
        }
        if self.version.is_empty() {
            errors.push(ValidationError::new("api.version", "version cannot be empty"));
        }
        if self.product.is_empty() {
            errors.push(ValidationError::new("api.product", "product cannot be empty"));
        }

        errors
    }

    /// Client options for these settings.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            version: self.version.clone(),
            product: self.product.clone(),
        }
    }
}

/// Account credentials.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AccountConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.email.is_empty() {
            errors.push(ValidationError::new(
                "account.email",
                "email is required while the collector is enabled",
            ));
        } else if !self.email.contains('@') {
            errors.push(ValidationError::new(
                "account.email",
                format!("'{}' is not an email address", self.email),
            ));
        }
        if self.password.is_empty() {
            errors.push(ValidationError::new(
                "account.password",
                "password is required while the collector is enabled",
            ));
        }

        errors
    }
}

/// Background collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Whether to poll the upstream API at all.
    pub enabled: bool,
    /// Poll interval in seconds.
    pub poll_interval: u64,
    /// Load the graph history once at startup.
    pub backfill: bool,
}

/// Minimum poll interval in seconds.
pub const MIN_POLL_INTERVAL: u64 = 30;
/// Maximum poll interval in seconds (1 hour).
pub const MAX_POLL_INTERVAL: u64 = 3600;

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: 60,
            backfill: true,
        }
    }
}

impl CollectorConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.poll_interval < MIN_POLL_INTERVAL {
            errors.push(ValidationError::new(
                "collector.poll_interval",
                format!(
                    "poll interval {} is too short (minimum {} seconds)",
                    self.poll_interval, MIN_POLL_INTERVAL
                ),
            ));
        } else if self.poll_interval > MAX_POLL_INTERVAL {
            errors.push(ValidationError::new(
                "collector.poll_interval",
                format!(
                    "poll interval {} is too long (maximum {} seconds / 1 hour)",
                    self.poll_interval, MAX_POLL_INTERVAL
                ),
            ));
        }

        errors
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `collector.poll_interval`).
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("glucolink")
        .join("server.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            account: AccountConfig {
                email: "me@example.com".to_string(),
                password: "secret".to_string(),
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.collector.enabled);
        assert!(config.collector.backfill);
        assert_eq!(config.collector.poll_interval, 60);
    }

    #[test]
    fn test_config_full_toml() {
        let toml = r#"
            [server]
            bind = "0.0.0.0:9090"

            [api]
            base_url = "https://api-eu.libreview.io"
            timeout_secs = 10

            [account]
            email = "me@example.com"
            password = "hunter2"

            [collector]
            poll_interval = 120
            backfill = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9090");
        assert_eq!(config.api.base_url, "https://api-eu.libreview.io");
        assert_eq!(config.api.timeout_secs, 10);
        // Unset keys keep their defaults.
        assert_eq!(config.api.version, DEFAULT_VERSION);
        assert_eq!(config.account.email, "me@example.com");
        assert_eq!(config.collector.poll_interval, 120);
        assert!(!config.collector.backfill);
        assert!(config.collector.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("server.toml");

        let mut config = valid_config();
        config.server.bind = "0.0.0.0:9191".to_string();
        config.collector.poll_interval = 300;
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.server.bind, "0.0.0.0:9191");
        assert_eq!(loaded.collector.poll_interval, 300);
        assert_eq!(loaded.account.email, "me@example.com");
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "this is not valid { toml").unwrap();

        let result = Config::load(&config_path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_default_config_path() {
        assert!(default_config_path().ends_with("glucolink/server.toml"));
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config = valid_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_client_options_from_api_config() {
        let api = ApiConfig {
            base_url: "http://localhost:1234".to_string(),
            timeout_secs: 5,
            ..ApiConfig::default()
        };
        let options = api.client_options();
        assert_eq!(options.base_url, "http://localhost:1234");
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.product, DEFAULT_PRODUCT);
    }

    // ======================================================================
    // Validation
    // ======================================================================

    #[test]
    fn test_default_config_requires_credentials() {
        let err = Config::default().validate().unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["account.email", "account.password"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_credentials_optional_without_collector() {
        let mut config = Config::default();
        config.collector.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_bind_validation() {
        let ok = |bind: &str| ServerConfig {
            bind: bind.to_string(),
        };
        assert!(ok("127.0.0.1:8080").validate().is_empty());
        assert!(ok("[::1]:8080").validate().is_empty());
        assert!(ok("localhost:8080").validate().is_empty());

        let errors = ok("").validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("cannot be empty"));

        let errors = ok("127.0.0.1").validate();
        assert!(errors[0].message.contains("host:port"));

        let errors = ok("127.0.0.1:0").validate();
        assert!(errors[0].message.contains("cannot be 0"));

        let errors = ok("127.0.0.1:abc").validate();
        assert!(errors[0].message.contains("must be a number"));
    }

    #[tokio::test]
    async fn test_bind_listener_resolves_host_names() {
        let server = ServerConfig {
            bind: "localhost:0".to_string(),
        };
        let listener = server.bind_listener().await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());

        let server = ServerConfig {
            bind: "127.0.0.1:0".to_string(),
        };
        assert!(server.bind_listener().await.is_ok());
    }

    #[test]
    fn test_api_validation() {
        let api = ApiConfig {
            base_url: "ftp://nope".to_string(),
            timeout_secs: 0,
            version: String::new(),
            ..ApiConfig::default()
        };
        let fields: Vec<_> = api.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, ["api.base_url", "api.timeout_secs", "api.version"]);
    }

    #[test]
    fn test_poll_interval_bounds() {
        let mut collector = CollectorConfig {
            poll_interval: 5,
            ..CollectorConfig::default()
        };
        assert!(collector.validate()[0].message.contains("too short"));

        collector.poll_interval = 7200;
        assert!(collector.validate()[0].message.contains("too long"));

        collector.poll_interval = MIN_POLL_INTERVAL;
        assert!(collector.validate().is_empty());
    }

    #[test]
    fn test_invalid_email() {
        let account = AccountConfig {
            email: "not-an-email".to_string(),
            password: "pw".to_string(),
        };
        let errors = account.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("not an email"));
    }

    #[test]
    fn test_validation_error_display_lists_all() {
        let err = Config::default().validate().unwrap_err();
        let display = err.to_string();
        assert!(display.contains("account.email"));
        assert!(display.contains("account.password"));
    }
}
