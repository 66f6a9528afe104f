//! Client configuration.
//!
//! The service base URL is an explicit value handed to client construction,
//! not process-wide state: two clients in one process can point at two
//! different servers, and tests can point at an ephemeral mock without
//! touching globals.

use crate::error::ClientError;
use std::time::Duration;

/// Configuration for a [`crate::client::ConvertClient`] or
/// [`crate::blocking::BlockingClient`].
///
/// Built via [`ClientConfig::builder()`] or [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use docserve_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://conversion.internal:5001/v1")
///     .request_timeout_secs(15)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the conversion service, without a trailing slash.
    /// Default: `http://localhost:5001/v1`.
    pub base_url: String,

    /// TCP connect timeout. Default: 10 s.
    pub connect_timeout: Duration,

    /// Per-request timeout for submits and status/result reads. Default: 30 s.
    pub request_timeout: Duration,

    /// Per-request timeout for the synchronous conversion endpoint, which
    /// holds the connection open until the server finishes converting.
    /// Default: 600 s.
    pub convert_timeout: Duration,
}

/// Default base URL of a locally running conversion service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5001/v1";

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            convert_timeout: Duration::from_secs(600),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Absolute URL for an endpoint path such as `/tasks/{id}`.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout = Duration::from_secs(secs);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout = Duration::from_secs(secs);
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout = Duration::from_secs(secs);
        self
    }

    /// Build the configuration, validating the base URL.
    pub fn build(self) -> Result<ClientConfig, ClientError> {
        let mut config = self.config;
        config.base_url = normalize_base_url(&config.base_url)?;
        if config.request_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "request timeout must be non-zero".into(),
            ));
        }
        Ok(config)
    }
}

/// Strip trailing slashes and check the URL is absolute http(s).
fn normalize_base_url(url: &str) -> Result<String, ClientError> {
    let trimmed = url.trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed).map_err(|e| ClientError::InvalidBaseUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ClientError::InvalidBaseUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_service() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5001/v1");
        assert_eq!(config.endpoint("/tasks/abc"), "http://localhost:5001/v1/tasks/abc");
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let config = ClientConfig::builder()
            .base_url("http://example.com/v1/")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "http://example.com/v1");
    }

    #[test]
    fn builder_rejects_non_http_scheme() {
        let err = ClientConfig::builder()
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), "invalid-base-url");
    }

    #[test]
    fn builder_rejects_relative_url() {
        let err = ClientConfig::builder()
            .base_url("localhost:5001")
            .build();
        assert!(err.is_err());
    }
}
