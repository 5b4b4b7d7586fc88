//! Document input: turn a user-supplied path or URL into an upload.
//!
//! The backend receives the PDF as a multipart file part, so the document is
//! read fully into memory. The PDF magic bytes (`%PDF`) and the configured
//! size limit are checked before upload.

use crate::config::ClientConfig;
use crate::error::Doc2ChartError;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// MIME type sent with every document part.
pub const PDF_MIME: &str = "application/pdf";

/// A document selected for upload.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// File name sent in the multipart part.
    pub name: String,
    /// Raw PDF bytes.
    pub data: Arc<[u8]>,
}

impl DocumentUpload {
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a local path or HTTP(S) URL into a validated [`DocumentUpload`].
pub async fn resolve_document(
    input: &str,
    config: &ClientConfig,
) -> Result<DocumentUpload, Doc2ChartError> {
    let doc = if is_url(input) {
        download_url(input, config.download_timeout_secs, config.max_document_bytes).await?
    } else {
        read_local(Path::new(input)).await?
    };
    validate(&doc, config.max_document_bytes)?;
    Ok(doc)
}

/// Check PDF magic bytes and the size limit.
pub fn validate(doc: &DocumentUpload, limit: u64) -> Result<(), Doc2ChartError> {
    let size = doc.data.len() as u64;
    if size > limit {
        return Err(Doc2ChartError::DocumentTooLarge {
            name: doc.name.clone(),
            size,
            limit,
        });
    }
    if doc.data.len() < 4 || &doc.data[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        let n = doc.data.len().min(4);
        magic[..n].copy_from_slice(&doc.data[..n]);
        return Err(Doc2ChartError::NotAPdf {
            name: doc.name.clone(),
            magic,
        });
    }
    Ok(())
}

async fn read_local(path: &Path) -> Result<DocumentUpload, Doc2ChartError> {
    let data = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Doc2ChartError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Doc2ChartError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("Read local document {} ({} bytes)", path.display(), data.len());
    Ok(DocumentUpload::new(name, data))
}

async fn download_url(
    url: &str,
    timeout_secs: u64,
    limit: u64,
) -> Result<DocumentUpload, Doc2ChartError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Doc2ChartError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Doc2ChartError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Doc2ChartError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Doc2ChartError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = filename_from_url(url);
    if let Some(size) = response.content_length().filter(|&n| n > limit) {
        return Err(Doc2ChartError::DocumentTooLarge { name, size, limit });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Doc2ChartError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(DocumentUpload::new(name, bytes.to_vec()))
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}
