//! A running client: store, controller, and the reactive render task.
//!
//! ```text
//! submit_* ──▶ controller ──▶ store ──▶ render_stream ──▶ preview
//!                                   (spawned task)
//! ```
//!
//! The controller never touches the preview and the render task never
//! touches the backend. They meet only at the store's diagram source.
//!
//! # Example
//!
//! ```rust,no_run
//! use doc2chart::{ClientConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::connect(ClientConfig::default())?;
//!     let outcome = session.submit_text("Alice meets Bob, Bob meets Carol").await;
//!     if let Some(message) = outcome.error_message() {
//!         eprintln!("{message}");
//!     }
//!     session.settled().await;
//!     println!("{}", session.preview().to_html());
//!     Ok(())
//! }
//! ```

use crate::config::ClientConfig;
use crate::controller::{SubmissionController, SubmissionOutcome};
use crate::engine::{DiagramCompiler, MermaidRsCompiler};
use crate::error::Doc2ChartError;
use crate::pipeline::backend::{DiagramBackend, HttpBackend};
use crate::pipeline::input::DocumentUpload;
use crate::pipeline::render::{DiagramRenderer, RenderOutcome};
use crate::preview::PreviewSurface;
use crate::store::{InputMode, UiStore};
use crate::stream::render_stream;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct Session {
    store: Arc<UiStore>,
    controller: SubmissionController,
    preview: watch::Receiver<PreviewSurface>,
    render_task: JoinHandle<()>,
}

impl Session {
    /// Start a session against `backend`, rendering with `compiler`.
    ///
    /// Spawns the render task, so this must be called inside a tokio
    /// runtime. The task renders the initial empty source straight away.
    pub fn start(
        config: ClientConfig,
        backend: Arc<dyn DiagramBackend>,
        compiler: Arc<dyn DiagramCompiler>,
    ) -> Self {
        let store = Arc::new(UiStore::new());
        let (preview_tx, preview_rx) = watch::channel(PreviewSurface::new());
        let mut frames = render_stream(&store, DiagramRenderer::new(compiler));
        let observer = config.observer.clone();

        let render_task = tokio::spawn(async move {
            while let Some(frame) = frames.next().await {
                let kind = frame.outcome.kind();
                debug!("Preview replaced with {:?}", kind);
                preview_tx.send_modify(|p| p.show(frame.source, frame.outcome));
                if let Some(ref obs) = observer {
                    obs.on_render(kind);
                }
            }
        });

        let controller = SubmissionController::new(Arc::clone(&store), backend, config);
        Self {
            store,
            controller,
            preview: preview_rx,
            render_task,
        }
    }

    /// Start a session against the HTTP backend named in `config`, rendering
    /// with [`MermaidRsCompiler`].
    pub fn connect(config: ClientConfig) -> Result<Self, Doc2ChartError> {
        let backend = HttpBackend::new(&config)?;
        Ok(Self::start(
            config,
            Arc::new(backend),
            Arc::new(MermaidRsCompiler::new()),
        ))
    }

    pub fn store(&self) -> &Arc<UiStore> {
        &self.store
    }

    pub fn controller(&self) -> &SubmissionController {
        &self.controller
    }

    /// Select text mode, set `text`, and submit.
    pub async fn submit_text(&self, text: impl Into<String>) -> SubmissionOutcome {
        self.store.set_mode(InputMode::Text);
        self.store.set_text(text);
        self.controller.submit_current().await
    }

    /// Select document mode, choose `document` (or clear the choice), and
    /// submit.
    pub async fn submit_document(&self, document: Option<DocumentUpload>) -> SubmissionOutcome {
        self.store.set_mode(InputMode::Document);
        self.store.set_file(document);
        self.controller.submit_current().await
    }

    /// A copy of the preview as it is right now.
    pub fn preview(&self) -> PreviewSurface {
        self.preview.borrow().clone()
    }

    /// Receiver notified whenever the preview is replaced.
    pub fn subscribe_preview(&self) -> watch::Receiver<PreviewSurface> {
        self.preview.clone()
    }

    /// Wait until the preview shows the store's current diagram source, then
    /// return what it shows.
    ///
    /// Returns immediately with the last shown content if the render task has
    /// stopped.
    pub async fn settled(&self) -> RenderOutcome {
        let mut rx = self.preview.clone();
        loop {
            let target = self.store.diagram_source();
            {
                let surface = rx.borrow_and_update();
                if surface.rendered_source() == Some(target.as_str()) {
                    return surface.current().clone();
                }
            }
            if rx.changed().await.is_err() {
                return rx.borrow().current().clone();
            }
        }
    }

    /// Write the preview to `path`.
    ///
    /// A `.svg` path receives the bare artifact and fails with
    /// [`Doc2ChartError::NoArtifact`] when the preview shows a placeholder or
    /// an error. Any other path receives the full HTML page. The file is
    /// written to a sibling temp path first and renamed into place.
    pub async fn save_preview(&self, path: impl AsRef<Path>) -> Result<(), Doc2ChartError> {
        let path = path.as_ref();
        let surface = self.preview();
        let is_svg = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

        let contents = if is_svg {
            match surface.current() {
                RenderOutcome::Artifact { svg, .. } => svg.clone(),
                other => {
                    return Err(Doc2ChartError::NoArtifact {
                        path: path.to_path_buf(),
                        showing: format!("{:?}", other.kind()).to_lowercase(),
                    })
                }
            }
        } else {
            surface.render_page(&self.store.snapshot())
        };

        let write_err = |e: std::io::Error| Doc2ChartError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);
        tokio::fs::write(tmp_path, contents.as_bytes())
            .await
            .map_err(write_err)?;
        tokio::fs::rename(tmp_path, path).await.map_err(write_err)?;

        info!("Wrote preview to {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.render_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::pipeline::backend::BackendReply;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedBackend(BackendReply);

    #[async_trait]
    impl DiagramBackend for FixedBackend {
        async fn process_text(&self, _text: &str) -> Result<BackendReply, TransportError> {
            Ok(self.0.clone())
        }

        async fn process_document(
            &self,
            _document: &DocumentUpload,
        ) -> Result<BackendReply, TransportError> {
            Ok(self.0.clone())
        }
    }

    fn session(reply: BackendReply) -> Session {
        Session::start(
            ClientConfig::default(),
            Arc::new(FixedBackend(reply)),
            Arc::new(MermaidRsCompiler::new()),
        )
    }

    #[tokio::test]
    async fn fresh_session_settles_on_placeholder() {
        let s = session(BackendReply::new(200, json!({})));
        assert_eq!(s.settled().await, RenderOutcome::Placeholder);
        assert_eq!(s.preview().rendered_source(), Some(""));
    }

    #[tokio::test]
    async fn submitted_text_reaches_the_preview() {
        let s = session(BackendReply::new(
            200,
            json!({ "mermaid_code": "graph TD; A-->B;" }),
        ));
        assert!(s.submit_text("A meets B").await.is_completed());
        assert!(s.settled().await.is_artifact());
        assert!(s.preview().to_html().starts_with("<svg"));
    }

    #[tokio::test]
    async fn missing_document_is_rejected() {
        let s = session(BackendReply::new(200, json!({})));
        let outcome = s.submit_document(None).await;
        assert_eq!(outcome.error_message().as_deref(), Some("Please choose a PDF file"));
        assert_eq!(s.store().snapshot().mode, InputMode::Document);
    }

    #[tokio::test]
    async fn save_preview_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(BackendReply::new(
            200,
            json!({ "raw_mermaid": "graph LR; A-->B" }),
        ));

        let svg_path = dir.path().join("out.svg");
        s.settled().await;
        let err = s.save_preview(&svg_path).await.unwrap_err();
        assert!(matches!(err, Doc2ChartError::NoArtifact { .. }));
        assert!(err.to_string().contains("placeholder"));

        s.submit_text("A then B").await;
        s.settled().await;
        s.save_preview(&svg_path).await.unwrap();
        let svg = std::fs::read_to_string(&svg_path).unwrap();
        assert!(svg.starts_with("<svg"));

        let html_path = dir.path().join("nested").join("out.html");
        s.save_preview(&html_path).await.unwrap();
        let html = std::fs::read_to_string(&html_path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<svg"));
    }
}
