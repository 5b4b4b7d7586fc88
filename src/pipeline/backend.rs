//! Backend transport: the only stage with network I/O.
//!
//! [`DiagramBackend`] is the seam between the controller and the network.
//! [`HttpBackend`] talks to the real service with `reqwest`; tests inject an
//! in-process implementation instead. A backend only moves bytes: it reports
//! the status code and the parsed JSON body and leaves interpretation of both
//! to [`crate::pipeline::extract`].

use crate::config::ClientConfig;
use crate::error::{Doc2ChartError, TransportError};
use crate::pipeline::input::{DocumentUpload, PDF_MIME};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Status code and JSON body of a backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: u16,
    pub body: Value,
}

impl BackendReply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The summarisation / diagram-generation service.
///
/// Each call issues exactly one request; implementations must not retry.
#[async_trait]
pub trait DiagramBackend: Send + Sync {
    /// Submit free text to the text-processing endpoint.
    async fn process_text(&self, text: &str) -> Result<BackendReply, TransportError>;

    /// Upload a document to the document-processing endpoint.
    async fn process_document(
        &self,
        document: &DocumentUpload,
    ) -> Result<BackendReply, TransportError>;
}

/// `reqwest`-based backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    text_url: String,
    document_url: String,
    health_url: String,
    timeout_secs: u64,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, Doc2ChartError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("doc2chart/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Doc2ChartError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            text_url: config.endpoint_url(&config.text_endpoint),
            document_url: config.endpoint_url(&config.document_endpoint),
            health_url: config.endpoint_url(&config.health_endpoint),
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// Query the liveness endpoint and return its body.
    ///
    /// Not used by the submission path.
    pub async fn health(&self) -> Result<String, Doc2ChartError> {
        let unhealthy = |reason: String| Doc2ChartError::Unhealthy {
            url: self.health_url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| unhealthy(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| unhealthy(e.to_string()))?;

        if !status.is_success() {
            return Err(unhealthy(format!("HTTP {status}")));
        }
        info!("Backend healthy: {}", self.health_url);
        Ok(body)
    }

    async fn read_reply(&self, response: reqwest::Response) -> Result<BackendReply, TransportError> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        let body: Value =
            serde_json::from_slice(&bytes).map_err(|e| TransportError::InvalidBody {
                detail: e.to_string(),
            })?;
        debug!("Backend replied {} ({} bytes)", status, bytes.len());
        Ok(BackendReply::new(status, body))
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            TransportError::Connect {
                url: e
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "backend".to_string()),
                detail: e.to_string(),
            }
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl DiagramBackend for HttpBackend {
    async fn process_text(&self, text: &str) -> Result<BackendReply, TransportError> {
        info!("POST {} ({} chars)", self.text_url, text.chars().count());
        let response = self
            .client
            .post(&self.text_url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        self.read_reply(response).await
    }

    async fn process_document(
        &self,
        document: &DocumentUpload,
    ) -> Result<BackendReply, TransportError> {
        info!(
            "POST {} ({}, {} bytes)",
            self.document_url,
            document.name,
            document.len()
        );
        let part = reqwest::multipart::Part::bytes(document.data.to_vec())
            .file_name(document.name.clone())
            .mime_str(PDF_MIME)
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.document_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        self.read_reply(response).await
    }
}
