//! Configuration for talking to the summarisation backend.
//!
//! Every knob lives in [`ClientConfig`], built via its [`ClientConfigBuilder`].
//! One struct is easy to share between the controller and the HTTP backend,
//! and easy to print in debug logs when a submission misbehaves.

use crate::error::Doc2ChartError;
use crate::progress::ObserverRef;
use std::fmt;

/// Default backend address, the local development server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Configuration for submissions and document uploads.
///
/// # Example
/// ```rust
/// use doc2chart::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://charts.example.com")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(
///     config.endpoint_url(&config.text_endpoint),
///     "https://charts.example.com/api/process-text"
/// );
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Scheme + host (+ optional path prefix) of the backend. Default: `http://localhost:5000`.
    pub base_url: String,

    /// Path of the text-processing endpoint. Default: `/api/process-text`.
    pub text_endpoint: String,

    /// Path of the document-processing endpoint. Default: `/api/process-pdf`.
    pub document_endpoint: String,

    /// Path of the liveness endpoint. Default: `/health`.
    pub health_endpoint: String,

    /// Whole-request timeout for submissions in seconds. Default: 120.
    ///
    /// Summarising a long PDF regularly takes tens of seconds on the backend,
    /// so the default is generous. A request that exceeds it fails the
    /// submission with a timeout error instead of leaving it in flight.
    pub request_timeout_secs: u64,

    /// Download timeout for URL document inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Largest document accepted for upload, in bytes. Default: 20 MiB.
    pub max_document_bytes: u64,

    /// Response field holding the diagram text. Default: `mermaid_code`.
    pub primary_field: String,

    /// Field consulted when the primary one is absent. Default: `raw_mermaid`.
    pub fallback_field: String,

    /// Optional observer for submission and render events.
    pub observer: Option<ObserverRef>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            text_endpoint: "/api/process-text".to_string(),
            document_endpoint: "/api/process-pdf".to_string(),
            health_endpoint: "/health".to_string(),
            request_timeout_secs: 120,
            download_timeout_secs: 120,
            max_document_bytes: 20 * 1024 * 1024,
            primary_field: "mermaid_code".to_string(),
            fallback_field: "raw_mermaid".to_string(),
            observer: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("text_endpoint", &self.text_endpoint)
            .field("document_endpoint", &self.document_endpoint)
            .field("health_endpoint", &self.health_endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("max_document_bytes", &self.max_document_bytes)
            .field("primary_field", &self.primary_field)
            .field("fallback_field", &self.fallback_field)
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<dyn SubmissionObserver>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Join `base_url` and an endpoint path with exactly one slash between them.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
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

    pub fn text_endpoint(mut self, path: impl Into<String>) -> Self {
        self.config.text_endpoint = path.into();
        self
    }

    pub fn document_endpoint(mut self, path: impl Into<String>) -> Self {
        self.config.document_endpoint = path.into();
        self
    }

    pub fn health_endpoint(mut self, path: impl Into<String>) -> Self {
        self.config.health_endpoint = path.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_document_bytes(mut self, bytes: u64) -> Self {
        self.config.max_document_bytes = bytes.max(4);
        self
    }

    pub fn primary_field(mut self, name: impl Into<String>) -> Self {
        self.config.primary_field = name.into();
        self
    }

    pub fn fallback_field(mut self, name: impl Into<String>) -> Self {
        self.config.fallback_field = name.into();
        self
    }

    pub fn observer(mut self, observer: ObserverRef) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, Doc2ChartError> {
        let c = &self.config;
        let url = reqwest::Url::parse(&c.base_url).map_err(|e| {
            Doc2ChartError::InvalidConfig(format!("base URL '{}' is invalid: {}", c.base_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Doc2ChartError::InvalidConfig(format!(
                "base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.request_timeout_secs == 0 {
            return Err(Doc2ChartError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(Doc2ChartError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.primary_field.trim().is_empty() || c.fallback_field.trim().is_empty() {
            return Err(Doc2ChartError::InvalidConfig(
                "Diagram field names must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_contract() {
        let c = ClientConfig::default();
        assert_eq!(c.text_endpoint, "/api/process-text");
        assert_eq!(c.document_endpoint, "/api/process-pdf");
        assert_eq!(c.health_endpoint, "/health");
        assert_eq!(c.primary_field, "mermaid_code");
        assert_eq!(c.fallback_field, "raw_mermaid");
    }

    #[test]
    fn endpoint_url_joins_cleanly() {
        let c = ClientConfig::builder()
            .base_url("http://example.com/")
            .build()
            .unwrap();
        assert_eq!(c.endpoint_url("/health"), "http://example.com/health");
        assert_eq!(c.endpoint_url("health"), "http://example.com/health");
    }

    #[test]
    fn rejects_non_http_base() {
        let err = ClientConfig::builder()
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http or https"), "got: {err}");
    }

    #[test]
    fn rejects_unparsable_base() {
        assert!(ClientConfig::builder().base_url("not a url").build().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(ClientConfig::builder()
            .request_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn rejects_blank_field_names() {
        assert!(ClientConfig::builder().primary_field("  ").build().is_err());
    }
}
