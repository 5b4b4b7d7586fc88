//! Error types for the doc2chart library.
//!
//! Errors fall into two groups:
//!
//! * [`Doc2ChartError`] is **fatal**: something outside the submission path
//!   went wrong (invalid configuration, unreadable document, failed write).
//!   Returned as `Err(Doc2ChartError)` from setup and I/O helpers.
//!
//! * Submission-path errors: [`ValidationError`], [`TransportError`] and
//!   [`RenderError`]. These never propagate to the caller as `Err`; the
//!   component that detects them converts them into store state or into a
//!   preview artifact, so the user can always retry.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doc2chart library.
#[derive(Debug, Error)]
pub enum Doc2ChartError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Document file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    /// The document exceeds the configured upload limit.
    #[error("Document '{name}' is {size} bytes; the upload limit is {limit} bytes")]
    DocumentTooLarge { name: String, size: u64, limit: u64 },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Backend errors ────────────────────────────────────────────────────
    /// The liveness endpoint did not answer with a success status.
    #[error("Backend at '{url}' is not healthy: {reason}")]
    Unhealthy { url: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An SVG export was requested but the preview holds no diagram.
    #[error("No diagram to write to '{path}': the preview shows {showing}")]
    NoArtifact { path: PathBuf, showing: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Input rejected before any network call.
///
/// The display strings are the exact messages shown next to the controls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Text mode with empty or whitespace-only text.
    #[error("Please enter some text")]
    EmptyText,

    /// Document mode with no file selected.
    #[error("Please choose a PDF file")]
    MissingDocument,
}

/// A failed exchange with the summarisation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not reach the backend at all.
    #[error("failed to connect to {url}: {detail}")]
    Connect { url: String, detail: String },

    /// The request exceeded `ClientConfig::request_timeout_secs`.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The backend answered with a non-success status.
    ///
    /// `message` is the body's `error` field, or the whole JSON payload when
    /// that field is absent.
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    /// The response body could not be parsed as JSON.
    #[error("invalid response body: {detail}")]
    InvalidBody { detail: String },

    /// Any other request failure reported by the HTTP client.
    #[error("{0}")]
    Request(String),
}

impl TransportError {
    /// The message handed to `fail_submission`.
    ///
    /// A non-success status carries the backend's own message verbatim; every
    /// other failure is an exception on the client side and gets the
    /// `"Error: "` prefix.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::HttpStatus { message, .. } => message.clone(),
            other => format!("Error: {other}"),
        }
    }

    /// `true` when the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// Prefix placed in front of every compiler message shown in the preview.
pub const RENDER_ERROR_PREFIX: &str = "Failed to render mermaid diagram: ";

/// Diagram text that failed to compile.
///
/// Shown only inside the preview area; the submission that produced the text
/// still counts as successful.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("{prefix}{message}", prefix = RENDER_ERROR_PREFIX)]
pub struct RenderError {
    /// Identifier generated for the failed render call.
    pub id: String,
    /// Compiler failure text, verbatim.
    pub message: String,
}
